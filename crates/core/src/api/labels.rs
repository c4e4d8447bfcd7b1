//! Display labels for pipeline step identifiers.

/// Known onboarding step identifiers and their labels.
const STEP_LABELS: &[(&str, &str)] = &[
    ("validate_credentials", "Validate credentials"),
    ("connect_channel", "Connect channel"),
    ("sync_locations", "Sync locations"),
    ("sync_products", "Sync products"),
    ("sync_inventory", "Sync inventory"),
    ("sync_customers", "Sync customers"),
    ("sync_orders", "Sync orders"),
    ("sync_returns", "Sync returns"),
    ("register_webhooks", "Register webhooks"),
    ("finalize", "Finalize setup"),
];

/// Human label for a step identifier.
///
/// Unknown identifiers are returned unchanged.
pub fn get_step_label(step_name: &str) -> &str {
    STEP_LABELS
        .iter()
        .find(|&&(name, _)| name == step_name)
        .map_or(step_name, |&(_, label)| label)
}
