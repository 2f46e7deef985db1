//! Property-based tests for unit rendering

use dapphubfs::catalog::{DappDescriptor, Port};
use dapphubfs::render::render_unit;
use proptest::prelude::*;

fn port_strategy() -> impl Strategy<Value = Port> {
    (any::<u16>(), prop_oneof!["tcp", "udp"], prop_oneof!["public", "private"])
        .prop_map(|(port, protocol, kind)| Port::new(port, &protocol, &kind))
}

/// Rendering is deterministic, wants only public ports and publishes all of them
#[test]
fn test_rendering_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                "[ -~]{0,40}",
                "[a-z0-9/:._-]{1,30}",
                prop::collection::vec(port_strategy(), 0..6),
            ),
            |(description, image, ports)| {
                let dapp = DappDescriptor::new("app", &description, &image, ports.clone());
                let first = render_unit(&dapp).unwrap();
                prop_assert_eq!(&first, &render_unit(&dapp).unwrap());

                let public = ports.iter().filter(|p| p.is_public()).count();
                prop_assert_eq!(first.matches("Wants=forward-port@").count(), public);
                for port in &ports {
                    let token = format!(
                        "-p{}/{}",
                        port.port.unwrap(),
                        port.protocol.as_deref().unwrap()
                    );
                    prop_assert!(first.contains(&token));
                }
                prop_assert!(first.is_ascii());
                Ok(())
            },
        )
        .unwrap();
}
