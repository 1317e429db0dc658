//! Wall Imagen - style-filter gateway
//!
//! Sends a user photo plus a fixed transformation prompt to the Imagen
//! `:predict` endpoint and returns the first generated image as a data URI.
//!
//! # Architecture
//!
//! ```text
//! ImageFilterGateway ──► TokenCache ──► TokenSource (static | key file | metadata)
//!        │                   ▲
//!        │                 Clock
//!        └──► reqwest ──► {location}-aiplatform.googleapis.com/...:predict
//! ```
//!
//! The step is fail-open: a successful response that carries no usable
//! image yields the caller's original image instead of an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use wall_imagen::{ImageFilterGateway, ImagenConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ImagenConfig::new().with_project_id("my-project");
//! let gateway = ImageFilterGateway::from_config(config)?;
//! let filtered = gateway.apply_filter("data:image/png;base64,iVBOR...", "defiant").await?;
//! println!("{} via {}", filtered.prompt, filtered.model);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod filters;
pub mod gateway;
pub mod service_account;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ImagenConfig;
pub use error::GatewayError;
pub use gateway::{FilteredImage, ImageFilterGateway};
pub use service_account::{ServiceAccountKey, ServiceAccountTokenSource};
pub use token::{AccessToken, MetadataTokenSource, StaticTokenSource, TokenCache, TokenSource};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
