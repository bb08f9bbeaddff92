use std::process::Stdio;

use ob_common::{parse_status_response, TxHash, TxStatus};
use tokio::process::Command;
use tracing::debug;

use super::{ChainClient, ChainError, InvokeCall};

pub const DEFAULT_PROGRAM: &str = "starknet";

/// Drives the `starknet` command line tool. Every call spawns one process and
/// waits for it to exit.
#[derive(Debug, Clone)]
pub struct StarknetCli {
    program: String,
    network: Option<String>,
    account: Option<String>,
}

impl Default for StarknetCli {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl StarknetCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            network: None,
            account: None,
        }
    }

    pub fn with_network(mut self, network: Option<String>) -> Self {
        self.network = network.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn with_account(mut self, account: Option<String>) -> Self {
        self.account = account.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn invoke_args(&self, call: &InvokeCall) -> Vec<String> {
        let mut args = vec![
            "invoke".to_string(),
            "--address".to_string(),
            call.contract_address.clone(),
            "--abi".to_string(),
            call.abi.display().to_string(),
            "--function".to_string(),
            call.function.clone(),
            "--inputs".to_string(),
        ];
        args.extend(call.inputs.iter().cloned());
        self.push_network(&mut args);
        if let Some(account) = &self.account {
            args.push("--account".to_string());
            args.push(account.clone());
        }
        args
    }

    pub fn status_args(&self, hash: &TxHash) -> Vec<String> {
        let mut args = vec!["tx_status".to_string(), format!("--hash={hash}")];
        self.push_network(&mut args);
        args
    }

    /// Shell-like rendering of an invocation, for dry runs and logs.
    pub fn describe_invoke(&self, call: &InvokeCall) -> String {
        std::iter::once(self.program.clone())
            .chain(self.invoke_args(call))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn push_network(&self, args: &mut Vec<String>) {
        if let Some(network) = &self.network {
            args.push("--network".to_string());
            args.push(network.clone());
        }
    }

    async fn run(&self, args: &[String]) -> Result<String, ChainError> {
        debug!(program = %self.program, ?args, "spawning chain tool");
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ChainError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ChainError::CommandFailed {
                program: self.program.clone(),
                subcommand: args.first().cloned().unwrap_or_default(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ChainError::NonUtf8 {
            program: self.program.clone(),
        })
    }
}

impl ChainClient for StarknetCli {
    async fn invoke(&self, call: &InvokeCall) -> Result<TxHash, ChainError> {
        let stdout = self.run(&self.invoke_args(call)).await?;
        parse_invoke_output(&stdout)
    }

    async fn tx_status(&self, hash: &TxHash) -> Result<TxStatus, ChainError> {
        let stdout = self.run(&self.status_args(hash)).await?;
        parse_status_response(&stdout).map_err(|source| ChainError::MalformedStatus {
            output: stdout.trim().to_string(),
            source,
        })
    }
}

/// The hash is whatever follows the last `": "` of the output, which is the
/// `Transaction hash: 0x...` line the tool prints last.
pub fn parse_invoke_output(stdout: &str) -> Result<TxHash, ChainError> {
    let trimmed = stdout.trim_end();
    let candidate = trimmed.rsplit(": ").next().unwrap_or_default().trim();
    if candidate.is_empty() || candidate.contains(char::is_whitespace) {
        return Err(ChainError::MissingTxHash {
            output: trimmed.to_string(),
        });
    }
    Ok(TxHash::new(candidate))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn call() -> InvokeCall {
        InvokeCall {
            contract_address: "0x07d8".to_string(),
            abi: PathBuf::from("order_book_abi.json"),
            function: "create_and_fill".to_string(),
            inputs: vec!["1000".into(), "5".into(), "0".into(), "10".into(), "20".into()],
        }
    }

    #[test]
    fn invoke_args_match_cli_layout() {
        let cli = StarknetCli::default();
        assert_eq!(
            cli.describe_invoke(&call()),
            "starknet invoke --address 0x07d8 --abi order_book_abi.json \
             --function create_and_fill --inputs 1000 5 0 10 20"
        );
    }

    #[test]
    fn network_and_account_are_appended() {
        let cli = StarknetCli::default()
            .with_network(Some("alpha-goerli".to_string()))
            .with_account(Some("orders".to_string()));
        let args = cli.invoke_args(&call());
        assert_eq!(
            &args[args.len() - 4..],
            ["--network", "alpha-goerli", "--account", "orders"]
        );
        assert_eq!(
            cli.status_args(&TxHash::new("0x1")),
            vec!["tx_status", "--hash=0x1", "--network", "alpha-goerli"]
        );
    }

    #[test]
    fn blank_network_is_ignored() {
        let cli = StarknetCli::default().with_network(Some("  ".to_string()));
        assert_eq!(cli.status_args(&TxHash::new("0x1")).len(), 2);
    }

    #[test]
    fn parses_tx_hash_from_invoke_output() {
        let out = "Invoke transaction was sent.\nContract address: 0x07d8\nTransaction hash: 0x5ab1\n";
        assert_eq!(parse_invoke_output(out).unwrap().as_str(), "0x5ab1");
    }

    #[test]
    fn rejects_output_without_hash() {
        assert!(matches!(
            parse_invoke_output("\n"),
            Err(ChainError::MissingTxHash { .. })
        ));
        assert!(matches!(
            parse_invoke_output("Error: something went wrong"),
            Err(ChainError::MissingTxHash { .. })
        ));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let cli = StarknetCli::new("ob-submitter-no-such-binary");
        let err = cli.tx_status(&TxHash::new("0x1")).await.unwrap_err();
        assert!(matches!(err, ChainError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_reported() {
        let cli = StarknetCli::new("false");
        let err = cli.invoke(&call()).await.unwrap_err();
        match err {
            ChainError::CommandFailed {
                subcommand, code, ..
            } => {
                assert_eq!(subcommand, "invoke");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
