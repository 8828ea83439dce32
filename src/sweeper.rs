//! Expiry sweeper
//!
//! Background loop that ticks on a fixed interval and asks the broker
//! to expire TEMPORARY messages past their TTL. The tick is delivered
//! as a command, so each sweep runs inside the broker's exclusion zone
//! and serializes with live client traffic; a message deleted by its
//! owner between ticks is simply skipped by the sweep.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::broker::BrokerCommand;

/// Run the sweep loop until the broker goes away.
pub async fn run_sweeper(interval: Duration, cmd_tx: mpsc::Sender<BrokerCommand>) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if cmd_tx.send(BrokerCommand::SweepExpired).await.is_err() {
            debug!("Broker closed, stopping expiry sweeper");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweeper_emits_sweep_commands() {
        let (tx, mut rx) = mpsc::channel(4);
        tokio::spawn(run_sweeper(Duration::from_millis(1), tx));

        let cmd = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("no tick within a second")
            .expect("sweeper dropped its sender");
        assert!(matches!(cmd, BrokerCommand::SweepExpired));
    }

    #[tokio::test]
    async fn test_sweeper_stops_when_broker_gone() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);

        tokio::time::timeout(Duration::from_secs(1), run_sweeper(Duration::from_millis(1), tx))
            .await
            .expect("sweeper kept running without a broker");
    }
}
