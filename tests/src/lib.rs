//! End-to-end acquisition tests against mock agents on loopback sockets.

#[cfg(test)]
mod util;

mod acquisition {
    mod integration;
}
