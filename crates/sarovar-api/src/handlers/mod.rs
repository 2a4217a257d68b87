mod analysis;
mod health;
mod modules;
mod roi;
mod sessions;

pub use analysis::{export_result, run_analysis, select_module, static_map};
pub use health::health_check;
pub use modules::list_modules;
pub use roi::{discard_roi, submit_roi};
pub use sessions::{create_session, delete_session, get_session};
