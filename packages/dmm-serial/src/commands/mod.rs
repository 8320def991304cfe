use std::future::Future;

use crate::Connection;

pub mod drive;

/// A request/reply exchange with a drive built from one or more packets.
pub trait Command {
    type Output;

    fn execute<C: Connection + ?Sized>(
        self,
        connection: &mut C,
    ) -> impl Future<Output = Result<Self::Output, C::Error>>;
}
