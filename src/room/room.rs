//! Room implementation
//!
//! A room owns its member table and its active stream table, and is the
//! fan-out point between them: adding a stream pushes it into every
//! qualifying member, adding a member replays every qualifying stream into
//! it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::config::RoomConfig;
use super::error::RoomError;
use super::member::{Member, MemberRole};
use super::stream::{RoomStream, Stream, StreamRef};
use super::table::OrderedTable;
use crate::stats::RoomStats;

/// Shared handle to a member
pub type MemberRef = Arc<dyn Member>;

/// A group session: members plus the streams active among them
///
/// Both tables have their own lock. Every operation that needs both takes
/// the member lock first, then the stream lock. Fan-out runs with the
/// member lock held, so a stream handler must not call back into the room
/// that is delivering to it.
pub struct Room {
    id: String,
    config: RoomConfig,
    members: Mutex<OrderedTable<MemberRef>>,
    streams: Mutex<OrderedTable<RoomStream>>,
}

impl Room {
    /// Create an empty room with default configuration
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_config(id, RoomConfig::default())
    }

    /// Create an empty room with custom configuration
    pub fn with_config(id: impl Into<String>, config: RoomConfig) -> Self {
        Self {
            id: id.into(),
            config,
            members: Mutex::new(OrderedTable::with_capacity(config.member_capacity)),
            streams: Mutex::new(OrderedTable::with_capacity(config.stream_capacity)),
        }
    }

    /// Room id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the room configuration
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Add a member and replay every active stream visible to its role
    ///
    /// A member with an id already in the room replaces the previous entry
    /// in place. The replaced member is not notified and keeps its streams.
    pub fn add_member(&self, member: MemberRef) {
        let mut members = self.members.lock();
        let replaced = members.insert(member.id(), Arc::clone(&member)).is_some();

        let role = member.role();
        let visible: Vec<StreamRef> = self
            .streams
            .lock()
            .values()
            .filter(|s| s.is_visible_to(role))
            .map(|s| Arc::clone(s.stream()))
            .collect();

        tracing::debug!(
            room = %self.id,
            member = member.id(),
            role = %role,
            replaced = replaced,
            replayed = visible.len(),
            "Member added"
        );

        // Member lock stays held so no stream can be added or removed mid-replay
        for stream in visible {
            member.add_stream(stream);
        }
    }

    /// Remove a member by id, returning the removed entry
    ///
    /// The member is not notified and its visible streams are left as-is.
    pub fn remove_member(&self, member: &dyn Member) -> Option<MemberRef> {
        let removed = self.members.lock().remove(member.id());

        if removed.is_some() {
            tracing::debug!(room = %self.id, member = member.id(), "Member removed");
        }

        removed
    }

    /// Look up a member by id
    pub fn get_member(&self, id: &str) -> Option<MemberRef> {
        self.members.lock().get(id).cloned()
    }

    /// Snapshot of members, in the order they joined
    pub fn get_members(&self) -> Vec<MemberRef> {
        self.members.lock().values().cloned().collect()
    }

    /// Number of members
    pub fn count_members(&self) -> usize {
        self.members.lock().len()
    }

    /// Activate a stream and push it to every member whose role matches
    ///
    /// An empty `recipients` slice makes the stream visible to all roles.
    /// A stream with an id already active replaces the previous entry, and
    /// matching members are notified again.
    pub fn add_stream(&self, stream: StreamRef, recipients: &[MemberRole]) {
        let members = self.members.lock();

        let room_stream = RoomStream::new(Arc::clone(&stream), recipients.iter().copied());
        let replaced = self
            .streams
            .lock()
            .insert(stream.id(), room_stream.clone())
            .is_some();

        let mut delivered = 0usize;
        for member in members.values() {
            if room_stream.is_visible_to(member.role()) {
                member.add_stream(Arc::clone(&stream));
                delivered += 1;
            }
        }

        tracing::debug!(
            room = %self.id,
            stream = stream.id(),
            recipients = ?recipients,
            replaced = replaced,
            delivered = delivered,
            "Stream added"
        );
    }

    /// Deactivate a stream and drop it from every member
    ///
    /// Every current member is asked to drop the stream, including members
    /// that were never shown it. Members that fail are collected into
    /// [`RoomError::PartialRemoval`]; the stream leaves the room either way.
    pub fn remove_stream(&self, stream: &dyn Stream) -> Result<(), RoomError> {
        let members = self.members.lock();

        if self.streams.lock().remove(stream.id()).is_none() {
            return Err(RoomError::StreamNotFound(stream.id().to_owned()));
        }

        let failures: Vec<RoomError> = members
            .values()
            .filter_map(|m| m.remove_stream(stream).err())
            .collect();

        if failures.is_empty() {
            tracing::debug!(room = %self.id, stream = stream.id(), "Stream removed");
            return Ok(());
        }

        tracing::warn!(
            room = %self.id,
            stream = stream.id(),
            failed = failures.len(),
            "Stream removed, some members did not hold it"
        );

        Err(RoomError::PartialRemoval {
            stream: stream.id().to_owned(),
            failures,
        })
    }

    /// Snapshot of active streams keyed by id
    pub fn get_streams(&self) -> HashMap<String, RoomStream> {
        self.streams
            .lock()
            .values()
            .map(|s| (s.id().to_owned(), s.clone()))
            .collect()
    }

    /// Number of active streams
    pub fn count_streams(&self) -> usize {
        self.streams.lock().len()
    }

    /// Empty both tables
    ///
    /// Members are not notified and keep whatever streams they last saw.
    /// The room stays usable afterwards; nothing marks it closed.
    pub fn close(&self) {
        let mut members = self.members.lock();
        let mut streams = self.streams.lock();

        tracing::debug!(
            room = %self.id,
            members = members.len(),
            streams = streams.len(),
            "Room closed"
        );

        *members = OrderedTable::with_capacity(self.config.member_capacity);
        *streams = OrderedTable::with_capacity(self.config.stream_capacity);
    }

    /// Point-in-time statistics
    pub fn stats(&self) -> RoomStats {
        let members = self.members.lock();
        let streams = self.streams.lock();

        let presenters = members
            .values()
            .filter(|m| m.role() == MemberRole::Presenter)
            .count();

        RoomStats {
            id: self.id.clone(),
            members: members.len(),
            presenters,
            viewers: members.len() - presenters,
            streams: streams.len(),
            broadcast_streams: streams.values().filter(|s| s.is_broadcast()).count(),
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("members", &self.count_members())
            .field("streams", &self.count_streams())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::room::member::RoomMember;
    use crate::room::stream::BaseStream;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn counting_member(id: &str, role: MemberRole) -> (Arc<RoomMember>, Arc<AtomicUsize>) {
        let member = Arc::new(RoomMember::new(id, role));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        member.on_stream(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (member, calls)
    }

    fn ids(streams: &HashMap<String, StreamRef>) -> HashSet<String> {
        streams.keys().cloned().collect()
    }

    /// Run `f` on another thread and fail if it does not finish in time
    fn run_with_deadline(f: impl FnOnce() + Send + 'static) {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            f();
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(30))
            .expect("room operations deadlocked or panicked");
    }

    #[test]
    fn test_add_and_remove_member() {
        let room = Room::new("r1");
        let viewer = Arc::new(RoomMember::viewer("m1"));
        room.add_member(viewer.clone());
        room.add_member(Arc::new(RoomMember::presenter("m2")));
        assert_eq!(room.count_members(), 2);

        assert!(room.remove_member(viewer.as_ref()).is_some());
        assert_eq!(room.count_members(), 1);

        // Absent member is not an error
        assert!(room.remove_member(viewer.as_ref()).is_none());
        assert_eq!(room.count_members(), 1);
    }

    #[test]
    fn test_get_members_in_join_order() {
        let room = Room::new("r1");
        room.add_member(Arc::new(RoomMember::viewer("b")));
        room.add_member(Arc::new(RoomMember::presenter("a")));
        room.add_member(Arc::new(RoomMember::viewer("c")));

        let ids: Vec<String> = room.get_members().iter().map(|m| m.id().to_owned()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(room.get_member("a").map(|m| m.role()), Some(MemberRole::Presenter));
        assert!(room.get_member("z").is_none());
    }

    #[test]
    fn test_fan_out_on_join() {
        let room = Room::new("r1");
        room.add_stream(BaseStream::video("s1").into_ref(), &[]);
        room.add_stream(BaseStream::video("s2").into_ref(), &[MemberRole::Presenter]);

        let viewer = Arc::new(RoomMember::viewer("v"));
        room.add_member(viewer.clone());
        let visible = viewer.get_streams();
        assert_eq!(visible.len(), 1);
        assert!(visible.contains_key("s1"));

        let presenter = Arc::new(RoomMember::presenter("p"));
        room.add_member(presenter.clone());
        assert_eq!(
            ids(&presenter.get_streams()),
            HashSet::from(["s1".to_owned(), "s2".to_owned()])
        );
    }

    #[test]
    fn test_replay_follows_stream_order() {
        let room = Room::new("r1");
        for id in ["s3", "s1", "s2"] {
            room.add_stream(BaseStream::video(id).into_ref(), &[]);
        }

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let member = Arc::new(RoomMember::viewer("m"));
        let sink = Arc::clone(&seen);
        member.on_stream(move |stream| sink.lock().push(stream.id().to_owned()));

        room.add_member(member);
        assert_eq!(*seen.lock(), vec!["s3", "s1", "s2"]);
    }

    #[test]
    fn test_fan_out_on_publish() {
        let room = Room::new("r1");
        let (viewer, viewer_calls) = counting_member("v", MemberRole::Viewer);
        let (presenter, presenter_calls) = counting_member("p", MemberRole::Presenter);
        room.add_member(viewer.clone());
        room.add_member(presenter.clone());

        room.add_stream(BaseStream::video("s1").into_ref(), &[MemberRole::Presenter]);
        assert_eq!(viewer_calls.load(Ordering::SeqCst), 0);
        assert_eq!(presenter_calls.load(Ordering::SeqCst), 1);

        room.add_stream(BaseStream::video("s2").into_ref(), &[]);
        assert_eq!(viewer_calls.load(Ordering::SeqCst), 1);
        assert_eq!(presenter_calls.load(Ordering::SeqCst), 2);

        room.add_stream(BaseStream::audio("s3").into_ref(), &[MemberRole::Viewer]);
        assert_eq!(viewer_calls.load(Ordering::SeqCst), 2);
        assert_eq!(presenter_calls.load(Ordering::SeqCst), 2);

        assert_eq!(viewer.count_streams(), 2);
        assert_eq!(presenter.count_streams(), 2);
    }

    #[test]
    fn test_readding_stream_overwrites_and_renotifies() {
        let room = Room::new("r1");
        let (viewer, calls) = counting_member("v", MemberRole::Viewer);
        room.add_member(viewer.clone());

        let stream = BaseStream::video("s1").into_ref();
        room.add_stream(stream.clone(), &[]);
        room.add_stream(stream.clone(), &[MemberRole::Presenter]);
        room.add_stream(stream, &[MemberRole::Viewer]);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(room.count_streams(), 1);
        assert_eq!(
            room.get_streams()["s1"].recipients(),
            &[MemberRole::Viewer][..]
        );
    }

    #[test]
    fn test_readding_member_overwrites_without_teardown() {
        let room = Room::new("r1");
        room.add_stream(BaseStream::video("s1").into_ref(), &[]);

        let first = Arc::new(RoomMember::viewer("m"));
        room.add_member(first.clone());
        let second = Arc::new(RoomMember::presenter("m"));
        room.add_member(second.clone());

        assert_eq!(room.count_members(), 1);
        assert_eq!(room.get_members()[0].role(), MemberRole::Presenter);
        // Replaced member keeps its streams
        assert_eq!(first.count_streams(), 1);
        assert_eq!(second.count_streams(), 1);
    }

    #[test]
    fn test_remove_stream() {
        let room = Room::new("r1");
        let (viewer, viewer_calls) = counting_member("v", MemberRole::Viewer);
        let (presenter, presenter_calls) = counting_member("p", MemberRole::Presenter);
        room.add_member(viewer.clone());
        room.add_member(presenter.clone());

        let stream = BaseStream::video("s1").into_ref();
        room.add_stream(stream.clone(), &[]);
        room.add_stream(BaseStream::audio("s2").into_ref(), &[]);
        assert_eq!(viewer_calls.load(Ordering::SeqCst), 2);

        room.remove_stream(stream.as_ref()).unwrap();

        // Removal is silent
        assert_eq!(viewer_calls.load(Ordering::SeqCst), 2);
        assert_eq!(presenter_calls.load(Ordering::SeqCst), 2);

        assert!(!room.get_streams().contains_key("s1"));
        assert_eq!(viewer.count_streams(), 1);
        assert_eq!(presenter.count_streams(), 1);
        assert!(!viewer.get_streams().contains_key("s1"));
    }

    #[test]
    fn test_remove_missing_stream_leaves_members_untouched() {
        let room = Room::new("r1");
        let viewer = Arc::new(RoomMember::viewer("v"));
        room.add_member(viewer.clone());
        room.add_stream(BaseStream::video("s1").into_ref(), &[]);

        let result = room.remove_stream(&BaseStream::video("missing"));
        assert_eq!(result, Err(RoomError::StreamNotFound("missing".into())));
        assert_eq!(viewer.count_streams(), 1);
        assert_eq!(room.count_streams(), 1);
    }

    #[test]
    fn test_partial_removal_still_removes_from_room() {
        let room = Room::new("r1");
        let viewer = Arc::new(RoomMember::viewer("v"));
        let presenter = Arc::new(RoomMember::presenter("p"));
        room.add_member(viewer.clone());
        room.add_member(presenter.clone());

        let stream = BaseStream::video("screen").into_ref();
        room.add_stream(stream.clone(), &[MemberRole::Presenter]);

        let err = room.remove_stream(stream.as_ref()).unwrap_err();
        assert_eq!(
            err,
            RoomError::PartialRemoval {
                stream: "screen".into(),
                failures: vec![RoomError::MemberStreamNotFound {
                    member: "v".into(),
                    stream: "screen".into(),
                }],
            }
        );
        assert_eq!(room.count_streams(), 0);
        assert_eq!(presenter.count_streams(), 0);
    }

    #[test]
    fn test_handler_lifecycle_through_room() {
        let room = Room::new("r1");
        let member = Arc::new(RoomMember::viewer("m"));
        room.add_member(member.clone());

        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let h1 = member.on_stream(move |s| sink.lock().push(format!("h1:{}", s.id())));
        let sink = Arc::clone(&events);
        member.on_stream(move |s| sink.lock().push(format!("h2:{}", s.id())));

        room.add_stream(BaseStream::video("video1").into_ref(), &[]);
        member.remove_on_stream_handler(h1).unwrap();
        room.add_stream(BaseStream::audio("audio1").into_ref(), &[]);

        assert_eq!(*events.lock(), vec!["h1:video1", "h2:video1", "h2:audio1"]);
    }

    #[test]
    fn test_snapshots_are_independent() {
        let room = Room::new("r1");
        room.add_member(Arc::new(RoomMember::viewer("m")));
        room.add_stream(BaseStream::video("s1").into_ref(), &[]);

        let mut streams = room.get_streams();
        streams.clear();
        let mut members = room.get_members();
        members.clear();

        assert_eq!(room.count_streams(), 1);
        assert_eq!(room.count_members(), 1);
    }

    #[test]
    fn test_close_empties_room_but_members_keep_streams() {
        let room = Room::new("r1");
        let member = Arc::new(RoomMember::viewer("m"));
        room.add_member(member.clone());
        room.add_stream(BaseStream::video("s1").into_ref(), &[]);

        room.close();

        assert_eq!(room.count_members(), 0);
        assert_eq!(room.count_streams(), 0);
        assert_eq!(member.count_streams(), 1);

        // A closed room is still usable
        room.add_stream(BaseStream::video("s2").into_ref(), &[]);
        assert_eq!(room.count_streams(), 1);
    }

    #[test]
    fn test_stats() {
        let room = Room::new("r1");
        room.add_member(Arc::new(RoomMember::viewer("v1")));
        room.add_member(Arc::new(RoomMember::viewer("v2")));
        room.add_member(Arc::new(RoomMember::presenter("p")));
        room.add_stream(BaseStream::video("s1").into_ref(), &[]);
        room.add_stream(BaseStream::video("s2").into_ref(), &[MemberRole::Presenter]);

        let expected = RoomStats {
            id: "r1".into(),
            members: 3,
            presenters: 1,
            viewers: 2,
            streams: 2,
            broadcast_streams: 1,
        };
        assert_eq!(room.stats(), expected);
        // Snapshots of an unchanged room compare equal
        assert_eq!(room.stats(), room.stats());
    }

    #[test]
    fn test_concurrent_add_remove_stream() {
        init_tracing();

        const THREADS: usize = 8;
        const ROUNDS: usize = 200;

        let room = Arc::new(Room::new("stress"));
        let members: Vec<Arc<RoomMember>> = (0..4)
            .map(|i| {
                let role = if i % 2 == 0 {
                    MemberRole::Viewer
                } else {
                    MemberRole::Presenter
                };
                Arc::new(RoomMember::new(format!("m{}", i), role))
            })
            .collect();
        for member in &members {
            room.add_member(member.clone());
        }

        let shared = Arc::clone(&room);
        run_with_deadline(move || {
            let handles: Vec<_> = (0..THREADS)
                .map(|t| {
                    let room = Arc::clone(&shared);
                    thread::spawn(move || {
                        for j in 0..ROUNDS {
                            let stream = BaseStream::video(format!("t{}-s{}", t, j)).into_ref();
                            room.add_stream(stream.clone(), &[]);
                            if j % 2 == 1 {
                                room.remove_stream(stream.as_ref()).unwrap();
                            }
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });

        let expected: HashSet<String> = (0..THREADS)
            .flat_map(|t| (0..ROUNDS).step_by(2).map(move |j| format!("t{}-s{}", t, j)))
            .collect();
        let active: HashSet<String> = room.get_streams().into_keys().collect();
        assert_eq!(active, expected);

        for member in &members {
            assert_eq!(ids(&member.get_streams()), expected);
        }
    }

    #[test]
    fn test_concurrent_joins_and_filtered_streams_converge() {
        init_tracing();

        const THREADS: usize = 4;
        const ROUNDS: usize = 100;

        let room = Arc::new(Room::new("stress"));
        let joined: Arc<parking_lot::Mutex<Vec<Arc<RoomMember>>>> =
            Arc::new(parking_lot::Mutex::new(Vec::new()));

        let shared = Arc::clone(&room);
        let sink = Arc::clone(&joined);
        run_with_deadline(move || {
            let mut handles = Vec::new();

            for t in 0..THREADS {
                let room = Arc::clone(&shared);
                handles.push(thread::spawn(move || {
                    for j in 0..ROUNDS {
                        let recipients: &[MemberRole] = match j % 3 {
                            0 => &[],
                            1 => &[MemberRole::Presenter],
                            _ => &[MemberRole::Viewer],
                        };
                        let stream = BaseStream::video(format!("t{}-s{}", t, j)).into_ref();
                        room.add_stream(stream.clone(), recipients);
                        if j % 4 == 0 {
                            match room.remove_stream(stream.as_ref()) {
                                Ok(()) | Err(RoomError::PartialRemoval { .. }) => {}
                                Err(e) => panic!("unexpected error: {}", e),
                            }
                        }
                    }
                }));
            }

            let room = Arc::clone(&shared);
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    let member = Arc::new(if i % 2 == 0 {
                        RoomMember::viewer(format!("m{}", i))
                    } else {
                        RoomMember::presenter(format!("m{}", i))
                    });
                    room.add_member(member.clone());
                    sink.lock().push(member);
                }
            }));

            for handle in handles {
                handle.join().unwrap();
            }
        });

        let active = room.get_streams();
        for member in joined.lock().iter() {
            let expected: HashSet<String> = active
                .values()
                .filter(|s| s.is_visible_to(member.role()))
                .map(|s| s.id().to_owned())
                .collect();
            assert_eq!(ids(&member.get_streams()), expected, "member {}", member.id());
        }
    }
}
