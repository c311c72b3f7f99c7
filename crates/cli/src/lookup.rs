// ============================================================================
// regcheck lookup / regcheck registries
// ============================================================================

use std::path::Path;

use regcheck_recon::{normalize_identifier, CheckConfig, Identifier, IdentifierSpec, LookupResult};
use serde::Serialize;

use crate::exit_codes::{EXIT_LOOKUP_EXPIRED, EXIT_LOOKUP_FAILED, EXIT_LOOKUP_NOT_FOUND};
use crate::registry;
use crate::settings;
use crate::CliError;

pub fn cmd_lookup(
    name: &str,
    identifier: &str,
    company: Option<&str>,
    config: Option<&Path>,
    json: bool,
) -> Result<(), CliError> {
    let config = settings::load_or_default(config)?;
    let registry = registry::build(name, &config)?;

    let id = match registry.identifier() {
        IdentifierSpec::Column { .. } => {
            if company.is_some() {
                return Err(CliError::args(format!("{name} does not search by company")));
            }
            Identifier::Single(normalize_identifier(identifier))
        }
        IdentifierSpec::NameOrCompany { .. } => Identifier::NameOrCompany {
            name: normalize_identifier(identifier),
            company: normalize_identifier(company.unwrap_or_default()),
        },
    };
    if id.is_blank() {
        return Err(CliError::args(format!(
            "{} is blank",
            registry.identifier().label()
        )));
    }

    let result = registry.resolve(&id);
    if json {
        let out = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::io(format!("cannot serialize result: {e}")))?;
        println!("{out}");
    } else {
        print_result(&result);
    }

    let (code, message) = match &result {
        LookupResult::Found(_) => return Ok(()),
        LookupResult::Expired(_) => (EXIT_LOOKUP_EXPIRED, format!("{} has expired", id.display())),
        LookupResult::NotFound => (
            EXIT_LOOKUP_NOT_FOUND,
            format!("{} is not on the {name} register", id.display()),
        ),
        LookupResult::QueryError { message } => (EXIT_LOOKUP_FAILED, message.clone()),
    };
    Err(CliError {
        code,
        message,
        hint: None,
    })
}

fn print_result(result: &LookupResult) {
    match result {
        LookupResult::Found(finding) | LookupResult::Expired(finding) => {
            let label = if matches!(result, LookupResult::Expired(_)) {
                "expired"
            } else {
                "status"
            };
            println!("{label}: {}", finding.status);
            for (key, value) in &finding.fields {
                println!("  {key}: {value}");
            }
        }
        LookupResult::NotFound => println!("not found"),
        LookupResult::QueryError { .. } => {}
    }
}

#[derive(Debug, Serialize)]
struct RegistryInfo<'a> {
    name: &'a str,
    keywords: &'a [&'static str],
    identifier: String,
}

pub fn cmd_registries(json: bool) -> Result<(), CliError> {
    let registries = registry::build_selected(&[], &CheckConfig::default())?;

    if json {
        let entries: Vec<RegistryInfo> = registries
            .iter()
            .map(|r| RegistryInfo {
                name: r.name(),
                keywords: r.keywords(),
                identifier: describe(r.identifier()),
            })
            .collect();
        let out = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::io(format!("cannot serialize registries: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    for r in &registries {
        println!(
            "{:<16} sheets: {:<24} identifier: {}",
            r.name(),
            r.keywords().join(" + "),
            describe(r.identifier())
        );
    }
    Ok(())
}

fn describe(spec: IdentifierSpec) -> String {
    match spec {
        IdentifierSpec::Column { column, label } => format!("{label} ({column})"),
        IdentifierSpec::NameOrCompany { label } => {
            format!("{label} (first_name + surname, else company)")
        }
    }
}
