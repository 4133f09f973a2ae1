//! User-facing transient notifications (toasts).

pub mod toast;

pub use toast::{Toast, ToastAction, ToastKind, ToastQueue};
