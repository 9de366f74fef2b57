//! Walks one user through the license lifecycle: request, approval, and a polling client
//! that waits for the decision.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use ed25519_dalek::SigningKey;
use time::Duration;
// self
use credential_broker::{
	auth::UserId,
	license::{Ed25519Signer, LicenseManager},
	poll::{LicensePoller, PollOutcome},
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let signer = Ed25519Signer::from_signing_key(SigningKey::from_bytes(&[42; 32]));
	let manager = LicenseManager::new(Arc::new(MemoryStore::default()), Arc::new(signer));
	let user = UserId::new("42")?;
	let admin = manager.clone();
	let approver = tokio::spawn(async move {
		tokio::time::sleep(std::time::Duration::from_millis(300)).await;

		for request in admin.pending_requests().await? {
			println!("Approving request {} for user {}.", request.id, request.user_id);

			admin.approve(&request.id).await?;
		}

		Ok::<_, credential_broker::error::Error>(())
	});
	let poller = LicensePoller::new(Arc::new(manager.clone()))
		.with_interval(Duration::milliseconds(100))
		.with_deadline(Duration::seconds(5));

	match poller.request_and_wait(&user, "demo-public-key").await? {
		PollOutcome::Approved(check) => println!("License active: {}.", check.has_license),
		PollOutcome::Rejected => println!("License request was rejected."),
		PollOutcome::TimedOut { attempts } => println!("No decision after {attempts} checks."),
	}

	approver.await??;

	Ok(())
}
