//! # Probe Scenarios
//!
//! End-to-end probe runs over loopback UDP:
//!
//! | Scenario | Target | Verdict |
//! |----------|--------|---------|
//! | A | live discovery session | `Success`, exit 0 |
//! | B | socket that never answers | `Timeout`, exit 1 |
//! | C | truncated node id | `ParseError`, nothing bound |
//! | D | local port already taken | `StartupFailure`, exit 1 |
//! | - | cancelled mid-run | `Interrupted`, port released |

#[cfg(test)]
mod tests {
    use std::future::pending;
    use std::net::{SocketAddr, UdpSocket};
    use std::time::Duration;

    use disco_connect::{ProbeConfig, ProbeController, ProbeResult, ProbeState};
    use disco_discovery::test_utils::identity;
    use disco_discovery::{
        DiscoverySession, EngineConfig, NodeIdentity, NodeState, ParseError, SessionConfig,
        StartupError,
    };
    use tokio::time::Instant;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn loopback() -> SessionConfig {
        SessionConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            restrict: None,
            engine: EngineConfig::for_testing(),
        }
    }

    fn probe(timeout: Duration) -> ProbeConfig {
        ProbeConfig {
            session: loopback(),
            timeout,
        }
    }

    /// A bound socket that swallows everything, and an identity pointing at it.
    fn silent_peer() -> (UdpSocket, NodeIdentity) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let target = identity(11, socket.local_addr().unwrap());
        (socket, target)
    }

    fn free_port() -> SocketAddr {
        UdpSocket::bind("127.0.0.1:0").unwrap().local_addr().unwrap()
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    /// Scenario A: a responsive peer completes the handshake.
    #[tokio::test]
    async fn test_scenario_a_responsive_peer_succeeds() {
        let responder = DiscoverySession::start(loopback()).await.unwrap();
        let mut responder_events = responder.subscribe();
        let target = *responder.local_identity();

        let mut controller = ProbeController::new(target, probe(Duration::from_secs(5)));
        let result = controller.run(pending::<String>()).await;

        assert!(result.is_success(), "got {result}");
        assert_eq!(result.exit_code(), 0);
        assert_eq!(
            result.to_string(),
            "Successfully initiated connection with remote!"
        );
        assert_eq!(controller.state(), ProbeState::Succeeded);

        // The responder saw the prober ping it and moved it out of unknown.
        let mut saw_prober = false;
        while let Ok(Some(event)) = responder_events.try_recv() {
            if let Some(t) = event.as_transition() {
                if t.from == NodeState::Unknown {
                    saw_prober = true;
                }
            }
        }
        assert!(saw_prober);

        responder.shutdown().await;
    }

    /// Scenario B: nobody answers, the deadline decides.
    #[tokio::test]
    async fn test_scenario_b_unresponsive_peer_times_out() {
        let (_silent, target) = silent_peer();
        let deadline = Duration::from_millis(400);

        let started = Instant::now();
        let result = ProbeController::new(target, probe(deadline))
            .run(pending::<String>())
            .await;

        assert!(matches!(result, ProbeResult::Timeout), "got {result}");
        assert_eq!(result.exit_code(), 1);
        assert!(started.elapsed() >= deadline);
    }

    /// Scenario C: a truncated id never gets as far as a socket.
    #[test]
    fn test_scenario_c_truncated_id_is_parse_error() {
        let descriptor = "enode://1dd9d65c4552b5eb43d5ad55a2ee3f56c6cbc1c64a5c8d659f51fcd51bace24351232b8d7821617d2b29b54b81cdefb9b3e9c37d7fd5f63270bcc9e1a6f6a43@10.3.58.6:30303";
        assert!(matches!(
            NodeIdentity::parse(descriptor),
            Err(ParseError::InvalidIdLength { .. })
        ));
    }

    /// Scenario D: the listen port is taken.
    #[tokio::test]
    async fn test_scenario_d_port_in_use_is_startup_failure() {
        let holder = UdpSocket::bind("127.0.0.1:0").unwrap();
        let taken = holder.local_addr().unwrap();
        let (_silent, target) = silent_peer();

        let mut config = probe(Duration::from_secs(30));
        config.session.listen_addr = taken;

        let started = Instant::now();
        let mut controller = ProbeController::new(target, config);
        let result = controller.run(pending::<String>()).await;

        assert!(matches!(
            result,
            ProbeResult::StartupFailure(StartupError::Bind { .. })
        ));
        assert_eq!(result.exit_code(), 1);
        assert_eq!(controller.state(), ProbeState::Failed);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    /// Cancellation before any answer, then the port is free again.
    #[tokio::test]
    async fn test_interrupted_probe_releases_port() {
        let (_silent, target) = silent_peer();
        let listen = free_port();

        let mut config = probe(Duration::from_secs(30));
        config.session.listen_addr = listen;

        let result = ProbeController::new(target, config)
            .run(async { "terminated".to_string() })
            .await;

        assert_eq!(result.to_string(), "Received exit signal: terminated");
        assert_eq!(result.exit_code(), 1);
        UdpSocket::bind(listen).expect("port released after interruption");
    }

    /// Probing twice from the same fixed port works; each run cleans up.
    #[tokio::test]
    async fn test_back_to_back_probes_reuse_listen_port() {
        let responder = DiscoverySession::start(loopback()).await.unwrap();
        let target = *responder.local_identity();
        let listen = free_port();

        for _ in 0..2 {
            let mut config = probe(Duration::from_secs(5));
            config.session.listen_addr = listen;
            let result = ProbeController::new(target, config)
                .run(pending::<String>())
                .await;
            assert!(result.is_success(), "got {result}");
        }

        responder.shutdown().await;
    }

    /// Config from TOML drives the run.
    #[tokio::test]
    async fn test_probe_config_from_toml() {
        let (_silent, target) = silent_peer();
        let mut config = ProbeConfig::parse(
            r#"
            [probe]
            listen_addr = "127.0.0.1:0"
            timeout_secs = 1

            [engine]
            response_timeout_ms = 50
            refresh_interval_secs = 1
            "#,
        )
        .unwrap();
        config.session.engine.max_tracked_nodes = 4;

        let result = ProbeController::new(target, config)
            .run(pending::<String>())
            .await;
        assert!(matches!(result, ProbeResult::Timeout), "got {result}");
    }
}
