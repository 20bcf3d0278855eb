mod countdown;

pub use countdown::{
    Countdown, CountdownState, SessionKind, FIVE_MINUTE_WARNING_MS, WARNING_BODY, WARNING_TITLE,
};
