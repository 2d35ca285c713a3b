//! Demonstrate diagnostics for invalid specifications and fatal concept errors.

use specfile_rs::{ConceptDictionary, ConceptError, SpecParser};

fn main() {
    // Errors and warnings are collected, the document is still returned
    let input = "\
# Orders
## Ship
* ship <missing> to \"depot
## Ship
* ship again
## Empty
";
    let (spec, result) = specfile_rs::parse(input, "orders.spec").expect("no concepts to expand");
    println!("Scenarios parsed: {}", spec.scenarios.len());
    for err in &result.parse_errors {
        println!("Parse error: {err}");
        println!("  Kind: {:?}", err.kind);
        println!("  Lines: {}-{}", err.span.start, err.span.end);
    }
    for warning in &result.warnings {
        println!("Warning: {:?} at line {}", warning.kind, warning.span.start);
    }

    println!();

    // Duplicate concept definitions fail the load
    let mut concepts = ConceptDictionary::new();
    if let Err(err) = concepts.load("dup.cpt", "# greet\n* wave\n\n# greet\n* nod\n") {
        println!("Concept error: {err}");
    }

    println!();

    // Circular concepts abort the parse
    let mut concepts = ConceptDictionary::new();
    concepts
        .load("loop.cpt", "# left\n* right\n\n# right\n* left\n")
        .expect("valid concepts");
    match SpecParser::new().parse("# Loop\n## S\n* left\n", &concepts, "loop.spec") {
        Ok(_) => println!("Parsed OK (unexpected)"),
        Err(ConceptError::Circular { file, chain }) => {
            println!("Circular concept in {file}: {chain}");
        }
        Err(err) => println!("Concept error: {err}"),
    }
}
