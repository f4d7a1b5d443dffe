//! End-to-end session scenarios against the public API

use std::sync::Arc;
use std::time::Duration;

use cadence_core::mock::{MockPlayerFactory, MockTransport, RecordingHandler};
use cadence_core::{ConnectionRegistry, EventEmitter, LifecycleController, SessionConfig};
use cadence_plugin_api::{
    CloseFrame, ContextError, ContextState, GuildId, SessionId, SocketContext, SocketContextExt,
    UserId,
};

fn controller(
    config: SessionConfig,
) -> (
    Arc<LifecycleController>,
    Arc<MockPlayerFactory>,
    Arc<RecordingHandler>,
) {
    let factory = Arc::new(MockPlayerFactory::new());
    let handler = Arc::new(RecordingHandler::new());
    let controller = LifecycleController::new(
        Arc::new(ConnectionRegistry::new()),
        factory.clone(),
        EventEmitter::new(vec![handler.clone()]),
        config,
    );
    (controller, factory, handler)
}

#[tokio::test(start_paused = true)]
async fn session_survives_socket_loss_until_grace_window_ends() {
    let (controller, factory, handler) = controller(SessionConfig {
        resuming: true,
        resume_timeout_secs: 60,
        ..SessionConfig::default()
    });
    let transport = Arc::new(MockTransport::new());
    let session = controller
        .open_with_id(SessionId(1), UserId(42), None, transport.clone())
        .await
        .unwrap();
    assert_eq!(session.state(), ContextState::Open);

    let p1 = session.player(GuildId(7)).await.unwrap();
    session
        .send(&serde_json::json!({"op": "event", "type": "TrackStartEvent"}))
        .unwrap();
    transport.wait_for_writes(2).await;

    session.close_websocket(Some(CloseFrame::new(1000, "bye"))).await;
    assert_eq!(session.state(), ContextState::Resumable);
    transport.wait_for_close().await;
    assert_eq!(transport.closes(), vec![Some(CloseFrame::new(1000, "bye"))]);

    let mut state = session.watch_state();
    state
        .wait_for(|state| *state == ContextState::Destroyed)
        .await
        .unwrap();

    assert!(session.players().is_empty());
    assert_eq!(factory.released(), vec![p1.guild_id()]);
    assert!(controller.registry().find(SessionId(1)).is_none());
    assert!(matches!(
        session.player(GuildId(7)).await,
        Err(ContextError::SessionDestroyed(SessionId(1)))
    ));

    let events = handler.events();
    assert!(events.contains(&"session_paused:1".to_string()));
    assert_eq!(events.last().unwrap(), "session_destroyed:1");
}

#[tokio::test]
async fn removed_player_is_replaced_by_a_new_one() {
    let (controller, factory, _handler) = controller(SessionConfig::default());
    let session = controller
        .open(UserId(42), None, Arc::new(MockTransport::new()))
        .await
        .unwrap();

    let (a, b) = tokio::join!(session.player(GuildId(9)), session.player(GuildId(9)));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(a.same_player(&b));
    assert_eq!(factory.created(), 1);

    session.destroy_player(GuildId(9)).await.unwrap();
    let c = session.player(GuildId(9)).await.unwrap();

    assert!(!c.same_player(&a));
    assert_eq!(factory.created(), 2);
}

#[tokio::test]
async fn send_on_resumable_session_is_not_connected() {
    let (controller, _factory, _handler) = controller(SessionConfig {
        resuming: true,
        ..SessionConfig::default()
    });
    let session = controller
        .open(UserId(42), None, Arc::new(MockTransport::new()))
        .await
        .unwrap();
    session.close_websocket(None).await;

    let err = session.send(&serde_json::json!({"op": "event"})).unwrap_err();

    assert!(matches!(err, ContextError::NotConnected { .. }));
    assert_eq!(session.state(), ContextState::Resumable);
}

#[tokio::test]
async fn destroyed_session_rejects_every_transition() {
    let (controller, _factory, _handler) = controller(SessionConfig {
        resuming: true,
        ..SessionConfig::default()
    });
    let session = controller
        .open(UserId(42), None, Arc::new(MockTransport::new()))
        .await
        .unwrap();
    controller.destroy_session(&session).await.unwrap();

    assert!(matches!(
        controller.destroy_session(&session).await,
        Err(ContextError::SessionDestroyed(_))
    ));
    assert!(matches!(
        controller
            .resume_session(&session, Arc::new(MockTransport::new()))
            .await,
        Err(ContextError::SessionDestroyed(_))
    ));
    assert!(matches!(
        session.destroy_player(GuildId(1)).await,
        Err(ContextError::SessionDestroyed(_))
    ));
    assert_eq!(session.state(), ContextState::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn resumed_session_keeps_players_and_receives_updates() {
    let (controller, factory, handler) = controller(SessionConfig {
        resuming: true,
        resume_timeout_secs: 30,
        ..SessionConfig::default()
    });
    let session = controller
        .open_with_id(SessionId(8), UserId(42), None, Arc::new(MockTransport::new()))
        .await
        .unwrap();
    session.player(GuildId(1)).await.unwrap();
    session.player(GuildId(2)).await.unwrap();
    session.close_websocket(None).await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    let transport = Arc::new(MockTransport::new());
    controller
        .resume(SessionId(8), transport.clone())
        .await
        .unwrap();

    transport.wait_for_writes(3).await;
    let written = transport.written_json();
    assert_eq!(written[0]["op"], "ready");
    assert_eq!(written[0]["resumed"], true);
    let mut guilds: Vec<u64> = written[1..]
        .iter()
        .map(|msg| msg["guildId"].as_u64().unwrap())
        .collect();
    guilds.sort();
    assert_eq!(guilds, vec![1, 2]);

    session.send(&serde_json::json!({"op": "event"})).unwrap();
    assert!(factory.released().is_empty());
    assert!(handler.events().contains(&"session_opened:8:true".to_string()));
}
