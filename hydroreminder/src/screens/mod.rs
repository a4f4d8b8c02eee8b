//! Screens module
//!
//! State and handlers behind each screen. Rendering lives in the frontend;
//! these types own what the screens display and forward actions to services.

pub mod home;
pub mod layout;
pub mod sign_in;
pub mod time_picker;

pub use home::{Alert, HomeScreen};
pub use layout::{route_for, Layout, Route};
pub use sign_in::SignInScreen;
pub use time_picker::TimePicker;
