//! Launch client: request a notebook launch and poll until its URL is ready.
//!
//! DESIGN
//! ======
//! A [`session::LaunchSession`] is built per launch attempt. It posts to the
//! launch endpoint, then either redirects straight away or polls the URL
//! endpoint on a fixed interval while animating a cosmetic progress value.
//! Transport ([`api::LaunchApi`]) and presentation ([`view::LaunchView`]) are
//! traits so the same flow drives a terminal, a browser shell, or a test fake.
//!
//! ERROR HANDLING
//! ==============
//! Failures never escape as `Err`: they end the attempt with a
//! [`session::LaunchOutcome`] after being logged or surfaced through the
//! view, depending on [`config::ErrorSurface`].

pub mod api;
pub mod config;
pub mod error;
pub mod progress;
pub mod session;
pub mod view;

pub use api::{Correlation, HttpLaunchApi, LaunchApi, LaunchRequest, LaunchResponse, UrlResponse};
pub use config::{ClientConfig, CorrelationMode, ErrorSurface};
pub use error::LaunchError;
pub use progress::Progress;
pub use session::{LaunchOutcome, LaunchSession, Phase};
pub use view::LaunchView;
