use crossterm::style::Stylize;

use super::{format_timestamp, load_registry, parse_registrations};
use crate::{
  generator::{
    orchestrator::{GeneratorConfig, Orchestrator},
    roundtrip::RoundTripVerifier,
  },
  ui::{Colors, VerifyCommand},
  utils::SpecLoader,
};

/// Runs the round-trip checks over every component with fixtures and fails if any of them mismatch.
///
/// Registry aliases given on the command line are compiled in, so the alias
/// agreement between validators and types is checked as well.
pub async fn verify_fixtures(command: VerifyCommand, colors: &Colors) -> anyhow::Result<()> {
  let VerifyCommand {
    input,
    examples_vendor,
    register,
    registry,
  } = command;

  let document = SpecLoader::open(&input).await?.parse()?;
  let registry = load_registry(registry.as_deref(), &parse_registrations(register)?).await?;
  let config = GeneratorConfig::builder()
    .examples_vendor(examples_vendor)
    .include_routes(false)
    .build();
  let orchestrator = Orchestrator::new(document, registry, config);
  let compiled = orchestrator.compile()?;

  let verifier = RoundTripVerifier::new(orchestrator.registry(), orchestrator.config());
  let report = verifier.verify(orchestrator.document(), &compiled);

  for error in &report.failures {
    eprintln!("{} {}", "Mismatch:".with(colors.accent()), error.to_string().with(colors.primary()));
  }

  let summary = format!(
    "Verified {} components, {} failed",
    report.checked.len(),
    report.failures.len()
  );
  println!(
    "{} {}",
    format_timestamp().with(colors.timestamp()),
    summary.with(if report.is_success() { colors.success() } else { colors.accent() })
  );

  if !report.is_success() {
    anyhow::bail!("round trip verification failed for {} components", report.failures.len());
  }
  Ok(())
}
