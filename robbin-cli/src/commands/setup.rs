use robbin_common::settings::{mask_api_key, Environment, ProjectSetup, RetentionPeriod};

pub fn execute(name: &str, environment: Environment, retention: RetentionPeriod) {
    let setup = ProjectSetup::new(name, environment);

    if !setup.can_create() {
        println!("A project name is required");
        return;
    }

    println!("✓ Project '{}' ready for {}", setup.project_name.trim(), setup.environment);
    println!("\n  API key: {}", setup.api_key);
    println!("  (shown once; later listings show {})", mask_api_key(&setup.api_key));
    println!("  Keep this key secure. Regenerating it invalidates the old key immediately.");

    println!("\nSDK snippet:\n");
    println!("{}", setup.sdk_snippet());

    let options: Vec<&str> = RetentionPeriod::ALL.iter().map(|p| p.label()).collect();
    println!(
        "\nEvent retention: {} (options: {})",
        retention.label(),
        options.join(", ")
    );
}
