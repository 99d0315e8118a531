// Everything in this crate is a thin layer over BSD sockets and `fcntl`, which only Unix-likes
// have in the shape we rely on.
#[cfg(not(unix))]
compile_error!("gwsock only supports Unix-like platforms");

// Byte counts returned by `read`/`recvfrom` are narrowed from `ssize_t` with plain casts.
#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("gwsock requires a 32-bit or 64-bit target");
