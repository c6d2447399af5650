/// Hard-navigation seam.
///
/// On an unrecoverable auth failure the client performs a full redirect to
/// the login entry point, discarding in-memory state. The library cannot
/// navigate by itself; the embedder supplies the mechanism.
pub trait Navigator: Send + Sync + std::fmt::Debug {
    fn redirect_to_login(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_login(&self) {}
}
