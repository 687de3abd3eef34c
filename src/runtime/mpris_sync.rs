use crate::mpris::MprisHandle;
use crate::player::PlaybackSession;

/// Push `session` to MPRIS.
///
/// Position moves on every tick, so a change in position alone only updates
/// the mirrored value and is not announced.
pub fn update_mpris(mpris: &MprisHandle, session: &PlaybackSession, last: &mut Option<PlaybackSession>) {
    if last.as_ref().is_some_and(|prev| same_but_position(prev, session)) {
        mpris.set_position(session.position);
    } else {
        mpris.sync(session);
    }
    *last = Some(session.clone());
}

pub(super) fn same_but_position(a: &PlaybackSession, b: &PlaybackSession) -> bool {
    a.state == b.state
        && a.current_track == b.current_track
        && a.current_index == b.current_index
        && a.playlist == b.playlist
        && a.volume == b.volume
        && a.duration == b.duration
}
