#![allow(unused_macros)]

macro_rules! ok_or_errno {
    ($success:expr => $($scb:tt)+) => {
        if $success {
            Ok($($scb)+)
        } else {
            Err(::std::io::Error::last_os_error())
        }
    };
}

/// Logs the error at the point where it was produced and passes it through unchanged.
macro_rules! log_err {
    ($res:expr, $($fmt:tt)+) => {
        ($res).map_err(|e| {
            ::log::error!("{}: {}", ::std::format_args!($($fmt)+), e);
            e
        })
    };
}

macro_rules! builder_setters {
    ($($(#[$attr:meta])* $name:ident : $ty:ty),+ $(,)?) => {$(
        $(#[$attr])*
        #[must_use = "builder setters take the entire structure and return the result"]
        #[inline(always)]
        pub fn $name(mut self, $name: $ty) -> Self {
            self.$name = $name;
            self
        }
    )+};
}
