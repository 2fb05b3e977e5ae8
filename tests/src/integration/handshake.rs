//! # Session Handshake Flows
//!
//! Two real sessions over loopback, observed only through their event
//! buses:
//!
//! 1. Both sides reach `known` for each other after one seeding
//! 2. A restrict netlist that excludes loopback stops the handshake cold
//! 3. A diagnostic sink sees the prober's full packet trail

#[cfg(test)]
mod tests {
    use std::future::pending;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use disco_connect::{DiagnosticSink, ProbeConfig, ProbeController, ProbeResult};
    use disco_discovery::{
        DiscoveryEvent, DiscoverySession, EngineConfig, EventSubscription, Netlist, NodeId,
        NodeState, PacketKind, SessionConfig,
    };
    use tokio::time::timeout;

    fn loopback() -> SessionConfig {
        SessionConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            restrict: None,
            engine: EngineConfig::for_testing(),
        }
    }

    async fn wait_for_known(events: &mut EventSubscription, node: &NodeId) {
        while let Some(event) = events.recv().await {
            if let Some(t) = event.as_transition() {
                if t.node == *node && t.to == NodeState::Known {
                    return;
                }
            }
        }
        panic!("event stream closed before {} became known", node.short());
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<DiscoveryEvent>>);

    impl DiagnosticSink for Recorder {
        fn record(&self, event: &DiscoveryEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    // =============================================================================
    // MUTUAL VERIFICATION
    // =============================================================================

    #[tokio::test]
    async fn test_both_sides_reach_known() {
        let a = DiscoverySession::start(loopback()).await.unwrap();
        let b = DiscoverySession::start(loopback()).await.unwrap();
        let mut a_events = a.subscribe();
        let mut b_events = b.subscribe();

        a.set_fallback_nodes(vec![*b.local_identity()]).await.unwrap();

        let b_id = *b.local_identity().id();
        let a_id = *a.local_identity().id();
        timeout(Duration::from_secs(5), wait_for_known(&mut a_events, &b_id))
            .await
            .expect("a verifies b");
        timeout(Duration::from_secs(5), wait_for_known(&mut b_events, &a_id))
            .await
            .expect("b verifies a");

        a.shutdown().await;
        b.shutdown().await;
    }

    // =============================================================================
    // RESTRICT NETLIST
    // =============================================================================

    #[tokio::test]
    async fn test_restricted_responder_drops_loopback_prober() {
        let restrict: Netlist = "10.0.0.0/8".parse().unwrap();
        let responder = DiscoverySession::start(SessionConfig {
            restrict: Some(restrict),
            ..loopback()
        })
        .await
        .unwrap();
        let mut responder_events = responder.subscribe();

        let config = ProbeConfig {
            session: loopback(),
            timeout: Duration::from_millis(500),
        };
        let result = ProbeController::new(*responder.local_identity(), config)
            .run(pending::<String>())
            .await;
        assert!(matches!(result, ProbeResult::Timeout), "got {result}");

        let mut dropped = 0;
        while let Ok(Some(event)) = responder_events.try_recv() {
            match event {
                DiscoveryEvent::PacketDropped { reason, .. } => {
                    assert_eq!(reason, "not contained in restrict netlist");
                    dropped += 1;
                }
                DiscoveryEvent::StateChanged(t) => panic!("unexpected transition {t}"),
                _ => {}
            }
        }
        assert!(dropped > 0);

        responder.shutdown().await;
    }

    // =============================================================================
    // DIAGNOSTICS
    // =============================================================================

    #[tokio::test]
    async fn test_diagnostic_sink_sees_packet_trail() {
        let responder = DiscoverySession::start(loopback()).await.unwrap();
        let target = *responder.local_identity();
        let recorder = Arc::new(Recorder::default());

        let config = ProbeConfig {
            session: loopback(),
            timeout: Duration::from_secs(5),
        };
        let result = ProbeController::new(target, config)
            .with_diagnostics(recorder.clone())
            .run(pending::<String>())
            .await;
        assert!(result.is_success(), "got {result}");

        let events = recorder.0.lock().unwrap();
        let sent_ping = events.iter().position(|e| {
            matches!(e, DiscoveryEvent::PacketSent { kind: PacketKind::Ping, to } if *to == target.udp_addr())
        });
        let got_pong = events.iter().position(|e| {
            matches!(e, DiscoveryEvent::PacketReceived { kind: PacketKind::Pong, node, .. } if node == target.id())
        });
        let known = events.iter().position(|e| {
            e.as_transition()
                .is_some_and(|t| t.node == *target.id() && t.to == NodeState::Known)
        });

        let (sent_ping, got_pong, known) = (sent_ping.unwrap(), got_pong.unwrap(), known.unwrap());
        assert!(sent_ping < got_pong);
        assert!(got_pong < known);
        drop(events);

        responder.shutdown().await;
    }
}
