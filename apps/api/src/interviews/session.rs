//! Pure session mechanics: room minting, roster bookkeeping, recording
//! stamps. Handlers read the row, run these, and write the result back.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::interview::{Participant, Recording};
use crate::models::user::UserRole;

/// Room ids exist for online interviews only; offline interviews carry a
/// physical location instead.
pub fn mint_room_id(interview_id: Uuid, at: DateTime<Utc>) -> String {
    format!("interview-{}-{}", interview_id, at.timestamp_millis())
}

pub fn meeting_link(frontend_url: &str, room_id: &str) -> String {
    format!(
        "{}/interview/room/{}",
        frontend_url.trim_end_matches('/'),
        room_id
    )
}

/// Every start call appends a fresh entry; reconnects are visible in the
/// roster as separate rows.
pub fn open_roster_entry(user_id: Uuid, role: UserRole, at: DateTime<Utc>) -> Participant {
    Participant {
        user_id,
        role,
        joined_at: at,
        left_at: None,
    }
}

/// Closes the most recent roster entry that is still open. Returns false
/// when every entry already carries a `left_at`.
pub fn close_latest_open(participants: &mut [Participant], at: DateTime<Utc>) -> bool {
    for entry in participants.iter_mut().rev() {
        if entry.left_at.is_none() {
            entry.left_at = Some(at);
            return true;
        }
    }
    false
}

/// First start wins: a reconnect never moves the original stamp.
pub fn stamp_recording_start(recording: &mut Option<Recording>, at: DateTime<Utc>) {
    let rec = recording.get_or_insert_with(Recording::default);
    if rec.start_time.is_none() {
        rec.start_time = Some(at);
    }
}

pub fn stamp_recording_end(recording: &mut Option<Recording>, at: DateTime<Utc>) {
    let rec = recording.get_or_insert_with(Recording::default);
    rec.end_time = Some(at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn room_id_embeds_interview_and_millis() {
        let id = Uuid::new_v4();
        let at = t0();
        let room = mint_room_id(id, at);
        assert!(room.starts_with("interview-"));
        assert!(room.contains(&id.to_string()));
        assert!(room.ends_with(&at.timestamp_millis().to_string()));
    }

    #[test]
    fn meeting_link_tolerates_trailing_slash() {
        let with = meeting_link("https://portal.example.com/", "interview-abc-1");
        let without = meeting_link("https://portal.example.com", "interview-abc-1");
        assert_eq!(with, without);
        assert_eq!(
            with,
            "https://portal.example.com/interview/room/interview-abc-1"
        );
    }

    #[test]
    fn close_picks_latest_open_entry() {
        let at = t0();
        let mut roster = vec![
            Participant {
                user_id: Uuid::new_v4(),
                role: UserRole::Recruiter,
                joined_at: at - Duration::minutes(10),
                left_at: Some(at - Duration::minutes(5)),
            },
            Participant {
                user_id: Uuid::new_v4(),
                role: UserRole::Student,
                joined_at: at - Duration::minutes(9),
                left_at: None,
            },
            Participant {
                user_id: Uuid::new_v4(),
                role: UserRole::Student,
                joined_at: at - Duration::minutes(2),
                left_at: None,
            },
        ];

        assert!(close_latest_open(&mut roster, at));
        assert_eq!(roster[2].left_at, Some(at));
        assert!(roster[1].left_at.is_none());

        assert!(close_latest_open(&mut roster, at));
        assert_eq!(roster[1].left_at, Some(at));

        assert!(!close_latest_open(&mut roster, at));
    }

    #[test]
    fn recording_start_is_write_once() {
        let first = t0();
        let mut recording = None;
        stamp_recording_start(&mut recording, first);
        stamp_recording_start(&mut recording, first + Duration::minutes(3));

        assert_eq!(recording.as_ref().and_then(|r| r.start_time), Some(first));
    }

    #[test]
    fn recording_end_works_without_a_start() {
        let at = t0();
        let mut recording = None;
        stamp_recording_end(&mut recording, at);

        let rec = recording.expect("recording created");
        assert!(rec.start_time.is_none());
        assert_eq!(rec.end_time, Some(at));
    }
}
