//! Segmented one-time-password entry for ratatui.
//!
//! [`OtpField`] renders N single-digit boxes and owns the entry behavior a
//! phone-number-verification screen expects: focus that follows typing,
//! paste distribution across boxes, backspace navigation, and opportunistic
//! autofill from an ambient SMS-code source ([`autofill`]).
//!
//! The host event loop forwards crossterm events and redraws:
//!
//! ```no_run
//! use otp_field::OtpField;
//!
//! let field = OtpField::new(6)?.with_placeholder("0");
//! // in the event loop:
//! //   field.handle_event(&event, area) -> signals
//! //   field.render(frame, area)
//! //   field.settle() once per turn
//! # Ok::<(), otp_field::OtpError>(())
//! ```
//!
//! Two notification signals are deliberately kept distinct (see
//! [`OtpSignal`]): `Changed` reports every accepted mutation, `Submitted`
//! reports completion. Callers opt into either, or register the equivalent
//! callbacks.

pub mod autofill;
pub mod buffer;
pub mod error;
pub mod field;
pub mod style;

pub use autofill::{AutofillSession, NullAutofill, OtpProvider};
pub use buffer::{numerals_of, OtpBuffer};
pub use error::{OtpError, Result};
pub use field::{OtpField, OtpSignal, DEFAULT_LENGTH};
pub use style::OtpStyle;
