pub mod browser;
pub mod cian;
pub mod error;
pub mod extract;
pub mod flats;
pub mod normalize;
pub mod traits;

pub use browser::BrowserSession;
pub use cian::CianJkScraper;
pub use error::ScrapeError;
pub use traits::PageSource;
