use parlor_protocol::RoomCode;

/// What a client's `step()` observed.
///
/// Front-ends redraw from the client's state after any update; the
/// variant only says why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientUpdate {
    /// Host: the room is open under this code. Guest: the host let us in.
    RoomReady(RoomCode),

    /// Game state changed because of a peer or a timer.
    StateChanged,

    /// The round countdown moved. Carries the seconds left.
    Tick(u32),

    /// Something the player should be told, such as a lost connection.
    /// The state has already been reset when this is about a failure.
    Notice(String),

    /// The game was finished and the room is closed.
    SessionEnded,
}
