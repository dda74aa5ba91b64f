pub mod console;
pub mod dispatch;
pub mod http;
pub mod mock;
pub mod relay;
pub mod templates;
pub mod traits;

pub use console::ConsoleMailer;
pub use dispatch::{Delivery, Dispatcher};
pub use http::HttpMailer;
pub use mock::RecordingMailer;
pub use relay::{OutboxRelay, RelayReport};
pub use traits::{Email, Mailer};
