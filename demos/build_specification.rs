//! Build a specification programmatically using the builder API.

use specfile_rs::{Scenario, SpecialKind, Specification, Step, Table};

fn main() {
    let spec = Specification::titled("login.spec", "Login")
        .tag("smoke")
        .comment("Users log in with a password.")
        .table(
            Table::with_headers(&["user", "password"])
                .row(&["ada", "secret"])
                .row(&["bob", "hunter2"]),
        )
        .context(Step::new("open the login page"))
        .scenario(
            Scenario::named("Valid credentials")
                .tag("happy")
                .step(
                    Step::new("log in as {} with {}")
                        .with_dynamic("user")
                        .with_dynamic("password"),
                )
                .step(Step::new("see the {} page").with_static("dashboard")),
        )
        .scenario(
            Scenario::named("Locked account")
                .step(
                    Step::new("load accounts from {}")
                        .with_special(SpecialKind::File, "locked.json"),
                )
                .step(
                    Step::new("expect errors").with_table(
                        Table::with_headers(&["code", "message"]).row(&["423", "locked"]),
                    ),
                ),
        )
        .tear_down_step(Step::new("log out"));

    let output = specfile_rs::format(&spec);
    println!("{output}");
}
