//! Parse a specification string and re-format it.

fn main() {
    let input = "\
Search
======
tags: catalogue,
  books
|title|
|-|
|Dune|
* open the catalogue
Find a book
-----------
* search for <title>
* the result list contains \"1\" entry [retry]
";

    let (spec, result) = specfile_rs::parse(input, "search.spec").expect("parse failed");

    println!("Valid: {}", result.ok());
    println!("Scenarios: {}", spec.scenarios.len());
    for scenario in &spec.scenarios {
        println!("  Scenario: {}", scenario.heading.value);
        for step in &scenario.steps {
            println!("    Step: {} {:?}", step.value, step.args);
        }
    }

    let output = specfile_rs::format(&spec);
    println!("\nFormatted output:\n{output}");
}
