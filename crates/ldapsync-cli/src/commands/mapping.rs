use std::fmt::Write;

use anyhow::Context;
use ldapsync_core::config::{EnvVars, keys};
use ldapsync_core::mapping::{AttributeMapping, Projection};

pub struct Mapping;

impl Mapping {
    pub fn execute(env: &EnvVars) -> anyhow::Result<()> {
        let overrides = env.get(keys::LDAP_ATTRIBUTE_MAPPING).unwrap_or_default();
        let mapping = AttributeMapping::build(overrides)
            .with_context(|| format!("Invalid {}", keys::LDAP_ATTRIBUTE_MAPPING))?;

        print!("{}", Self::render(&mapping, &Projection::GREENLIGHT));
        Ok(())
    }

    fn render(mapping: &AttributeMapping, projection: &Projection) -> String {
        let mut output = String::new();

        output.push_str("=== Attribute Mapping ===\n");
        for (key, sources) in mapping.iter() {
            let column = projection
                .column_for(key)
                .map_or_else(|| "(not stored)".to_string(), |column| format!("-> {column}"));
            let _ = writeln!(output, "{key:<12} {:<48} {column}", sources.join(", "));
        }

        let _ = writeln!(
            output,
            "\nIdentifier column: {}",
            projection.identifier_column()
        );

        output
    }
}
