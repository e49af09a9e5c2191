use colored::Colorize;

use gm_core::evaluate;

pub fn run(expression: &str, seed: Option<u64>) -> Result<(), String> {
    let mut rng = super::make_rng(seed);
    let result = evaluate(expression, &mut rng)
        .map_err(|e| format!("cannot roll '{expression}': {e}"))?;
    println!("  {}", result.display_text);
    println!("  Total: {}", result.total.to_string().bold());
    Ok(())
}
