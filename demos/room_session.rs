//! Room session walkthrough
//!
//! Run with: cargo run --example room_session
//!
//! Plays the part of a signaling layer: creates a room, lets a presenter
//! and two viewers join, publishes streams with different recipient
//! filters, and shows a transport task picking up streams through a
//! watch channel. Set `RUST_LOG=rtc_rooms=trace` for registry logs.

use std::sync::Arc;

use rtc_rooms::{
    watch_streams, BaseStream, Member, MemberRole, RoomManager, RoomMember, StreamKind,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rtc_rooms=debug".parse()?)
                .add_directive("room_session=debug".parse()?),
        )
        .init();

    let manager = Arc::new(RoomManager::new());
    let room = manager.create_room("weekly-sync");

    let host = Arc::new(RoomMember::presenter("host"));
    let alice = Arc::new(RoomMember::viewer("alice"));
    let bob = Arc::new(RoomMember::viewer("bob"));

    // Synchronous observer: runs on the publishing thread
    alice.on_stream(|stream| {
        tracing::info!(member = "alice", stream = stream.id(), "Start forwarding");
    });

    // Async observer: a transport task drains the channel
    let mut bob_watch = watch_streams(bob.as_ref());
    let transport = tokio::spawn(async move {
        let mut forwarded = Vec::new();
        while let Some(stream) = bob_watch.recv().await {
            tracing::info!(member = "bob", stream = stream.id(), "Start forwarding");
            forwarded.push(stream.id().to_owned());
        }
        forwarded
    });

    room.add_member(host.clone());
    room.add_member(alice.clone());

    let camera = BaseStream::new("host-camera", StreamKind::Video).into_ref();
    let notes = BaseStream::data("host-notes").into_ref();
    room.add_stream(camera.clone(), &[]);
    room.add_stream(notes.clone(), &[MemberRole::Presenter]);

    // Late joiner gets the camera replayed, not the presenter notes
    room.add_member(bob.clone());

    println!("{:?}", room.stats());
    for member in room.get_members() {
        let mut visible: Vec<String> = member.get_streams().into_keys().collect();
        visible.sort();
        println!("{} ({}) sees {:?}", member.id(), member.role(), visible);
    }

    room.remove_stream(camera.as_ref())?;
    if let Err(e) = room.remove_stream(notes.as_ref()) {
        // Viewers never held the presenter notes
        println!("notes removed with warnings: {}", e);
    }

    manager.destroy_room("weekly-sync")?;
    println!("{:?}", manager.stats());

    // Dropping the handler closes the channel and ends the transport task
    drop(bob);
    println!("bob's transport forwarded {:?}", transport.await?);

    Ok(())
}
