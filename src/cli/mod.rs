pub mod coach;
pub mod complete;
pub mod doctor;
pub mod next;
pub mod reset;
pub mod settings;
pub mod stats;
pub mod watch;

use lifelevels::memory::types::ActionDescriptor;

/// Human-readable rendering of an action.
pub fn print_action(action: &ActionDescriptor) {
    println!("{}  [{}]", action.title, action.id);
    println!("  {}", action.description);
    println!(
        "  {:?} · {} · {} · priority {}",
        action.action_type, action.category, action.estimated_time, action.priority
    );
    if !action.reasoning.is_empty() {
        println!("  Why: {}", action.reasoning);
    }
}
