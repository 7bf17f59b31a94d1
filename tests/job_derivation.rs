// tests/job_derivation.rs

use std::collections::BTreeMap;

use cijobs::changes::ProjectFileChanges;
use cijobs::dag::ProjectGraph;
use cijobs::jobs::{create_jobs, CommandVars, CreateOptions, Jobs, BASE_REF_VAR, EVENT_VAR};
use cijobs::test_env::WP_VERSION;
use cijobs_test_utils::builders::{
    ConfigFileBuilder, LintJobBuilder, ProjectBuilder, TestJobBuilder,
};
use cijobs_test_utils::fakes::FakeTestEnvResolver;
use cijobs_test_utils::init_tracing;

fn changed(entries: &[(&str, &[&str])]) -> ProjectFileChanges {
    ProjectFileChanges::Projects(
        entries
            .iter()
            .map(|(project, files)| {
                (
                    project.to_string(),
                    files.iter().map(|f| f.to_string()).collect(),
                )
            })
            .collect::<BTreeMap<_, _>>(),
    )
}

fn with_event(event: &str) -> CreateOptions {
    CreateOptions {
        command_vars: CommandVars::new().with(EVENT_VAR, event),
    }
}

async fn derive(graph: &ProjectGraph, changes: &ProjectFileChanges) -> Jobs {
    create_jobs(graph, changes, &CreateOptions::default(), &FakeTestEnvResolver::new())
        .await
        .unwrap()
}

/// root -> {a, b} -> c
fn diamond(c: ProjectBuilder) -> ProjectGraph {
    ConfigFileBuilder::new()
        .with_project(
            "root",
            ProjectBuilder::root()
                .depends_on("a")
                .depends_on("b")
                .job(LintJobBuilder::new("pnpm lint:root").build())
                .build(),
        )
        .with_project("a", ProjectBuilder::new("pkgs/a").depends_on("c").build())
        .with_project("b", ProjectBuilder::new("pkgs/b").depends_on("c").build())
        .with_project("c", c.build())
        .graph()
}

#[tokio::test]
async fn all_changes_create_each_job_once() {
    init_tracing();
    let graph = diamond(
        ProjectBuilder::new("pkgs/c")
            .job(LintJobBuilder::new("pnpm lint").build())
            .job(TestJobBuilder::new("Unit", "pnpm test").test_type("unit").build()),
    );

    let jobs = derive(&graph, &ProjectFileChanges::All).await;

    let lint: Vec<(&str, &str)> = jobs
        .lint
        .iter()
        .map(|j| (j.project_name.as_str(), j.command.as_str()))
        .collect();
    assert_eq!(lint, vec![("c", "pnpm lint"), ("root", "pnpm lint:root")]);

    assert_eq!(jobs.test.len(), 1);
    let test = &jobs.test[0];
    assert_eq!(test.project_name, "c");
    assert_eq!(test.project_path, "pkgs/c");
    assert_eq!(test.name, "Unit");
    assert_eq!(test.test_type, "unit");
    assert_eq!(test.shard_number, 0);
    assert!(!test.test_env.should_create);
}

#[tokio::test]
async fn unmatched_changes_create_nothing() {
    let graph = diamond(
        ProjectBuilder::new("pkgs/c")
            .job(LintJobBuilder::new("pnpm lint").changes("/\\.php$/").build()),
    );

    let jobs = derive(&graph, &changed(&[("c", &["readme.md"])])).await;
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn dependency_change_escalates_test_jobs_but_not_lint_jobs() {
    let graph = ConfigFileBuilder::new()
        .with_project(
            "a",
            ProjectBuilder::new("pkgs/a")
                .depends_on("b")
                .job(LintJobBuilder::new("pnpm lint").changes("/^src\\//").build())
                .job(
                    TestJobBuilder::new("E2E", "pnpm test:e2e")
                        .changes("/^src\\//")
                        .build(),
                )
                .build(),
        )
        .with_project("b", ProjectBuilder::new("pkgs/b").build())
        .graph();

    let jobs = derive(&graph, &changed(&[("b", &["lib.js"])])).await;

    assert!(jobs.lint.is_empty());
    assert_eq!(jobs.test.len(), 1);
    assert_eq!(jobs.test[0].project_name, "a");
}

#[tokio::test]
async fn only_for_dependencies_filters_escalation() {
    let graph = ConfigFileBuilder::new()
        .with_project(
            "a",
            ProjectBuilder::new("pkgs/a")
                .depends_on("b")
                .depends_on("c")
                .job(
                    TestJobBuilder::new("E2E", "pnpm test:e2e")
                        .changes("/^src\\//")
                        .only_for_dependency("b")
                        .build(),
                )
                .build(),
        )
        .with_project("b", ProjectBuilder::new("pkgs/b").build())
        .with_project("c", ProjectBuilder::new("pkgs/c").build())
        .graph();

    let jobs = derive(&graph, &changed(&[("c", &["lib.js"])])).await;
    assert!(jobs.test.is_empty());

    let jobs = derive(&graph, &changed(&[("b", &["lib.js"])])).await;
    assert_eq!(jobs.test.len(), 1);

    // The job's own patterns still apply.
    let jobs = derive(&graph, &changed(&[("a", &["src/main.ts"]), ("c", &["lib.js"])])).await;
    assert_eq!(jobs.test.len(), 1);
}

#[tokio::test]
async fn dependency_with_created_jobs_counts_as_changed() {
    // `b` has no changed files of its own, but its dependency `c` changed
    // and so `b` produced a test job.
    let graph = ConfigFileBuilder::new()
        .with_project(
            "a",
            ProjectBuilder::new("pkgs/a")
                .depends_on("b")
                .job(TestJobBuilder::new("A", "test:a").only_for_dependency("b").build())
                .build(),
        )
        .with_project(
            "b",
            ProjectBuilder::new("pkgs/b")
                .depends_on("c")
                .job(TestJobBuilder::new("B", "test:b").build())
                .build(),
        )
        .with_project("c", ProjectBuilder::new("pkgs/c").build())
        .graph();

    let jobs = derive(&graph, &changed(&[("c", &["lib.js"])])).await;

    let names: Vec<&str> = jobs.test.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A"]);
}

#[tokio::test]
async fn events_filter_jobs() {
    let graph = ConfigFileBuilder::new()
        .with_project(
            "a",
            ProjectBuilder::new("pkgs/a")
                .job(LintJobBuilder::new("pnpm lint").event("pull_request").build())
                .job(LintJobBuilder::new("pnpm lint:always").build())
                .build(),
        )
        .graph();
    let resolver = FakeTestEnvResolver::new();
    let all = ProjectFileChanges::All;

    let jobs = create_jobs(&graph, &all, &with_event("push"), &resolver).await.unwrap();
    assert_eq!(jobs.lint.len(), 1);
    assert_eq!(jobs.lint[0].command, "pnpm lint:always");

    let jobs = create_jobs(&graph, &all, &with_event("PULL_REQUEST"), &resolver)
        .await
        .unwrap();
    assert_eq!(jobs.lint.len(), 2);

    let jobs = create_jobs(&graph, &all, &CreateOptions::default(), &resolver)
        .await
        .unwrap();
    assert_eq!(jobs.lint.len(), 1);
}

#[tokio::test]
async fn command_vars_are_substituted() {
    let graph = ConfigFileBuilder::new()
        .with_project(
            "a",
            ProjectBuilder::new("pkgs/a")
                .job(LintJobBuilder::new("pnpm lint --base <baseRef> --on=<event>").build())
                .build(),
        )
        .graph();
    let options = CreateOptions {
        command_vars: CommandVars::new()
            .with(BASE_REF_VAR, "origin/trunk")
            .with(EVENT_VAR, "push"),
    };

    let jobs = create_jobs(&graph, &ProjectFileChanges::All, &options, &FakeTestEnvResolver::new())
        .await
        .unwrap();
    assert_eq!(jobs.lint[0].command, "pnpm lint --base origin/trunk --on=push");
}

#[tokio::test]
async fn sharded_test_job_expands() {
    let graph = ConfigFileBuilder::new()
        .with_project(
            "a",
            ProjectBuilder::new("pkgs/a")
                .job(
                    TestJobBuilder::new("E2E", "pnpm test:e2e")
                        .shard("--shard=1/3")
                        .shard("--shard=2/3")
                        .shard("--shard=3/3")
                        .report("e2e-results", "artifacts/results", true)
                        .build(),
                )
                .build(),
        )
        .graph();

    let jobs = derive(&graph, &ProjectFileChanges::All).await;

    let shards: Vec<(&str, &str, usize)> = jobs
        .test
        .iter()
        .map(|j| (j.name.as_str(), j.command.as_str(), j.shard_number))
        .collect();
    assert_eq!(
        shards,
        vec![
            ("E2E 1/3", "pnpm test:e2e --shard=1/3", 1),
            ("E2E 2/3", "pnpm test:e2e --shard=2/3", 2),
            ("E2E 3/3", "pnpm test:e2e --shard=3/3", 3),
        ]
    );
    assert!(jobs.test.iter().all(|j| j
        .report
        .as_ref()
        .is_some_and(|r| r.results_blob_name == "e2e-results" && r.allure)));
}

#[tokio::test]
async fn resolved_wordpress_version_is_added_to_name() {
    let graph = ConfigFileBuilder::new()
        .with_project(
            "a",
            ProjectBuilder::new("pkgs/a")
                .job(
                    TestJobBuilder::new("E2E", "pnpm test:e2e")
                        .test_env("pnpm env:start", Some("latest"), Some("8.2"))
                        .shard("--shard=1/2")
                        .shard("--shard=2/2")
                        .build(),
                )
                .build(),
        )
        .graph();
    let resolver = FakeTestEnvResolver::new().with_version("latest", "6.6.2");

    let jobs = create_jobs(&graph, &ProjectFileChanges::All, &CreateOptions::default(), &resolver)
        .await
        .unwrap();

    let names: Vec<&str> = jobs.test.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["E2E [WP 6.6.2] 1/2", "E2E [WP 6.6.2] 2/2"]);

    let env = &jobs.test[0].test_env;
    assert!(env.should_create);
    assert_eq!(env.start.as_deref(), Some("pnpm env:start"));
    assert_eq!(env.env_vars.get(WP_VERSION).map(String::as_str), Some("6.6.2"));
    assert_eq!(resolver.calls().len(), 1);
}

#[tokio::test]
async fn unavailable_prerelease_suppresses_job_once() {
    init_tracing();
    let graph = diamond(
        ProjectBuilder::new("pkgs/c")
            .job(
                TestJobBuilder::new("E2E", "pnpm test:e2e")
                    .test_env("pnpm env:start", Some("rc"), None)
                    .build(),
            )
            .job(TestJobBuilder::new("Unit", "pnpm test").build()),
    );
    let resolver = FakeTestEnvResolver::new();

    let jobs = create_jobs(&graph, &ProjectFileChanges::All, &CreateOptions::default(), &resolver)
        .await
        .unwrap();

    let names: Vec<&str> = jobs.test.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["Unit"]);
    // Reached through both `a` and `b`, resolved only once.
    assert_eq!(resolver.calls().len(), 1);
}

#[tokio::test]
async fn available_prerelease_creates_job() {
    let graph = ConfigFileBuilder::new()
        .with_project(
            "a",
            ProjectBuilder::new("pkgs/a")
                .job(
                    TestJobBuilder::new("E2E", "pnpm test:e2e")
                        .test_env("pnpm env:start", Some("rc"), None)
                        .build(),
                )
                .build(),
        )
        .graph();
    let resolver = FakeTestEnvResolver::new().with_version("rc", "6.7-RC1");

    let jobs = create_jobs(&graph, &ProjectFileChanges::All, &CreateOptions::default(), &resolver)
        .await
        .unwrap();

    assert_eq!(jobs.test.len(), 1);
    assert_eq!(jobs.test[0].name, "E2E [WP 6.7-RC1]");
}

/// root -> {first, second} -> c -> d, with test jobs on `a`, `b` and `c`.
fn shared_transitive_graph(first: &str, second: &str) -> ProjectGraph {
    let tested = |path: &str, name: &str, deps: &[&str]| {
        let mut project = ProjectBuilder::new(path).job(
            TestJobBuilder::new(name, &format!("test:{name}"))
                .changes("/^src\\//")
                .build(),
        );
        for dep in deps {
            project = project.depends_on(dep);
        }
        project.build()
    };

    ConfigFileBuilder::new()
        .with_project(
            "root",
            ProjectBuilder::root()
                .depends_on(first)
                .depends_on(second)
                .build(),
        )
        .with_project("a", tested("pkgs/a", "A", &["c"]))
        .with_project("b", tested("pkgs/b", "B", &["c"]))
        .with_project("c", tested("pkgs/c", "C", &["d"]))
        .with_project("d", ProjectBuilder::new("pkgs/d").build())
        .graph()
}

#[tokio::test]
async fn shared_dependency_escalates_every_dependent() {
    init_tracing();
    let changes = changed(&[("d", &["lib.js"])]);

    for (first, second) in [("a", "b"), ("b", "a")] {
        let graph = shared_transitive_graph(first, second);
        let jobs = derive(&graph, &changes).await;

        let mut names: Vec<&str> = jobs.test.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names[0], "C", "dependency jobs come first ({first} before {second})");
        names.sort();
        assert_eq!(names, vec!["A", "B", "C"], "{first} before {second}");
    }
}
