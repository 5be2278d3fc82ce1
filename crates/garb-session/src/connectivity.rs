//! Shared online/offline signal.
//!
//! The host platform pushes transitions into a [`ConnectivityHandle`];
//! components hold a [`ConnectivityMonitor`] and either poll
//! [`is_online`](ConnectivityMonitor::is_online) at decision points or await
//! [`changed`](ConnectivityMonitor::changed) for edge-triggered reactions.

use tokio::sync::watch;

/// Producer side of the signal. One per process, owned by whatever
/// integration layer actually knows about the network.
#[derive(Debug)]
pub struct ConnectivityHandle {
  tx: watch::Sender<bool>,
}

/// Consumer side. Cheap to clone; every clone observes the same signal.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
  rx: watch::Receiver<bool>,
}

/// Create a connectivity channel with the given starting state.
pub fn channel(
  initially_online: bool,
) -> (ConnectivityHandle, ConnectivityMonitor) {
  let (tx, rx) = watch::channel(initially_online);
  (ConnectivityHandle { tx }, ConnectivityMonitor { rx })
}

impl ConnectivityHandle {
  /// Record the current state. Monitors awaiting
  /// [`ConnectivityMonitor::changed`] wake only when the value flips.
  pub fn set_online(&self, online: bool) {
    self.tx.send_if_modified(|current| {
      let flipped = *current != online;
      *current = online;
      flipped
    });
  }
}

impl ConnectivityMonitor {
  /// The current state of the signal.
  pub fn is_online(&self) -> bool { *self.rx.borrow() }

  /// Wait for the next transition and return the new state.
  ///
  /// If the handle has been dropped this resolves immediately with the last
  /// observed state, so consumers degrade to whatever the signal last said.
  pub async fn changed(&mut self) -> bool {
    let _ = self.rx.changed().await;
    *self.rx.borrow_and_update()
  }
}
