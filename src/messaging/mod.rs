/// Messaging module for the audio manager
///
/// Splits traffic into two directions:
/// - **Events**: notifications of what the manager did (past tense, broadcast)
/// - **Commands**: requests queued from any thread (imperative, drained per tick)
///
/// ## Architecture
///
/// ```text
/// ┌──────────────┐   AudioCommand   ┌──────────────┐   AudioEvent   ┌───────────┐
/// │ CommandSender│ ───────────────> │ AudioManager │ ─────────────> │ Event Bus │
/// │ (any thread) │                  │  (tick owner)│                │           │
/// └──────────────┘                  └──────────────┘                └───────────┘
///                                                                         │
///                                                                         ▼
///                                                                   ┌───────────┐
///                                                                   │Subscribers│
///                                                                   └───────────┘
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let (events, _id) = manager.events().subscribe();
/// let sender = manager.command_sender();
///
/// // From a gameplay thread
/// sender.play("Footsteps");
///
/// // On the audio tick
/// manager.update(dt);
///
/// while let Ok(event) = events.try_recv() {
///     tracing::info!("{}", event.description());
/// }
/// ```

pub mod bus;
pub mod commands;
pub mod events;
pub mod executor;

// Re-export commonly used types
pub use bus::{EventBus, SubscriberId};
pub use commands::AudioCommand;
pub use events::AudioEvent;
pub use executor::{CommandQueue, CommandSender};
