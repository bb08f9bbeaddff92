pub mod ledger;
pub mod schedule;
pub mod status;
pub mod time;
pub mod txhash;

pub use ledger::{write_csv_summary, HashLedger, LedgerError, TxHash, DEFAULT_LEDGER_FILE};
pub use schedule::{OrderRecord, OrderSchedule, OrderTemplate, ScheduleError};
pub use status::{parse_status_response, TxStatus};
pub use time::{format_unix_date, parse_base_date, SECONDS_PER_DAY};
pub use txhash::{
    compute_hash_on_elements, selector_from_name, tx_hash_from_message, ChainId, L1Message,
    MessageError,
};
