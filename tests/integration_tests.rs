//! Integration tests for polyhedral model extraction.

use polyextract::prelude::*;
use polyextract::build_computations;
use std::cmp::Ordering;

fn build_one(source: &str, config: &BuilderConfig) -> Computation {
    let mut computations = build_computations(source, config).expect("Failed to build");
    assert_eq!(computations.len(), 1);
    computations.remove(0)
}

fn build_err(source: &str, config: &BuilderConfig) -> BuildError {
    let program = parse(source).expect("Failed to parse");
    ComputationBuilder::new(config.clone())
        .build(&program.functions[0])
        .expect_err("build should fail")
}

fn relations(relations: &[AccessRelation]) -> Vec<(String, String)> {
    relations.iter().map(|r| (r.space.clone(), r.to_string())).collect()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected.iter().map(|(s, r)| (s.to_string(), r.to_string())).collect()
}

struct Expected<'a> {
    space: &'a str,
    schedule: &'a str,
    reads: &'a [(&'a str, &'a str)],
    writes: &'a [(&'a str, &'a str)],
}

fn check(computation: &Computation, expected: &[Expected<'_>]) {
    assert_eq!(computation.num_stmts(), expected.len());
    for (stmt, exp) in computation.statements.iter().zip(expected) {
        assert_eq!(stmt.iteration_space.to_string(), exp.space, "{}", stmt.source);
        assert_eq!(stmt.execution_schedule.to_string(), exp.schedule, "{}", stmt.source);
        assert_eq!(relations(&stmt.reads), pairs(exp.reads), "reads of {}", stmt.source);
        assert_eq!(relations(&stmt.writes), pairs(exp.writes), "writes of {}", stmt.source);
    }
}

const MATRIX_ADD: &str = r#"
void matrix_add(int a, int b, int x[a][b], int y[a][b], int sum[a][b]) {
    int i;
    int j;
    for (i = 0; i < a; i++) {
        for (j = 0; j < b; j++) {
            sum[i][j] = x[i][j] + y[i][j];
        }
    }
}
"#;

const FORWARD_SOLVE: &str = r#"
int forward_solve(int n, int l[n][n], double b[n], double x[n]) {
    int i;
    for (i = 0; i < n; i++) {
        x[i] = b[i];
    }

    int j;
    for (j = 0; j < n; j++) {
        x[j] /= l[j][j];
        for (i = j + 1; i < n; i++) {
            if (l[i][j] > 0) {
                x[i] -= l[i][j] * x[j];
            }
        }
    }

    return 0;
}
"#;

#[test]
fn test_matrix_add() {
    let computation = build_one(MATRIX_ADD, &BuilderConfig::default());
    assert_eq!(computation.name, "matrix_add");
    let spaces: Vec<_> = computation.data_spaces.iter().map(String::as_str).collect();
    assert_eq!(spaces, vec!["sum", "x", "y"]);

    check(
        &computation,
        &[
            Expected { space: "{[]}", schedule: "{[]->[0,0,0,0,0]}", reads: &[], writes: &[] },
            Expected { space: "{[]}", schedule: "{[]->[1,0,0,0,0]}", reads: &[], writes: &[] },
            Expected {
                space: "{[i,j]: 0 <= i and i < a and 0 <= j and j < b}",
                schedule: "{[i,j]->[2,i,0,j,0]}",
                reads: &[("x", "{[i,j]->[i,j]}"), ("y", "{[i,j]->[i,j]}")],
                writes: &[("sum", "{[i,j]->[i,j]}")],
            },
        ],
    );
}

#[test]
fn test_forward_solve() {
    let computation = build_one(FORWARD_SOLVE, &BuilderConfig::default());
    let spaces: Vec<_> = computation.data_spaces.iter().map(String::as_str).collect();
    assert_eq!(spaces, vec!["b", "l", "x"]);

    check(
        &computation,
        &[
            Expected { space: "{[]}", schedule: "{[]->[0,0,0,0,0]}", reads: &[], writes: &[] },
            Expected {
                space: "{[i]: 0 <= i and i < n}",
                schedule: "{[i]->[1,i,0,0,0]}",
                reads: &[("b", "{[i]->[i]}")],
                writes: &[("x", "{[i]->[i]}")],
            },
            Expected { space: "{[]}", schedule: "{[]->[2,0,0,0,0]}", reads: &[], writes: &[] },
            Expected {
                space: "{[j]: 0 <= j and j < n}",
                schedule: "{[j]->[3,j,0,0,0]}",
                reads: &[("x", "{[j]->[j]}"), ("l", "{[j]->[j,j]}")],
                writes: &[("x", "{[j]->[j]}")],
            },
            Expected {
                space: "{[j,i]: 0 <= j and j < n and j + 1 <= i and i < n and l(i,j) > 0}",
                schedule: "{[j,i]->[3,j,1,i,0]}",
                reads: &[("x", "{[j,i]->[i]}"), ("l", "{[j,i]->[i,j]}"), ("x", "{[j,i]->[j]}")],
                writes: &[("x", "{[j,i]->[i]}")],
            },
            Expected { space: "{[]}", schedule: "{[]->[4,0,0,0,0]}", reads: &[], writes: &[] },
        ],
    );
}

#[test]
fn test_double_increment_fails() {
    let source = r#"
        int a() {
            int x;
            for (int i = 0; i < 5; i += 2) {
                x = i;
            }
            return x;
        }
    "#;
    let err = build_err(source, &BuilderConfig::default());
    assert_eq!(err.kind, BuildErrorKind::MalformedLoopHeader(LoopHeaderPart::Increment));
    assert_eq!(err.message, "Invalid increment in for loop -- must increase iterator by 1");
    assert_eq!(err.severity(), Severity::Input);
    assert_eq!(err.span.start_line, 4);

    assert!(build_computations(source, &BuilderConfig::default()).is_err());
}

#[test]
fn test_increment_forms() {
    let accepted = ["i++", "++i", "i += 1", "i -= -1", "i = i + 1", "i = 1 + i", "i += STEP"];
    let rejected = ["i += 2", "i--", "i *= 1", "j++", "i = i + 2", ""];
    let config = BuilderConfig::default().constant("STEP", 1);

    for inc in accepted {
        let source = format!(
            "void f(int n, int a[n]) {{ int j = 0; for (int i = 0; i < n; {}) a[i] = j; }}",
            inc
        );
        assert!(build_computations(&source, &config).is_ok(), "`{}` should be accepted", inc);
    }
    for inc in rejected {
        let source = format!(
            "void f(int n, int a[n]) {{ int j = 0; for (int i = 0; i < n; {}) a[i] = j; }}",
            inc
        );
        let err = build_err(&source, &config);
        assert_eq!(
            err.kind,
            BuildErrorKind::MalformedLoopHeader(LoopHeaderPart::Increment),
            "`{}` should be rejected",
            inc
        );
    }
}

#[test]
fn test_loop_header_check_order() {
    let err = build_err(
        "void f(int n) { int j; for (int i = 0, k = 0; i; i += 2) j = i; }",
        &BuilderConfig::default(),
    );
    assert_eq!(err.kind, BuildErrorKind::MalformedLoopHeader(LoopHeaderPart::Initializer));

    let err = build_err(
        "void f(int n) { int j; for (int i = 0; i; i += 2) j = i; }",
        &BuilderConfig::default(),
    );
    assert_eq!(err.kind, BuildErrorKind::MalformedLoopHeader(LoopHeaderPart::Condition));
    assert_eq!(err.message, "Invalid condition in for loop -- must be a binary comparison");
}

#[test]
fn test_loop_condition_is_invariant() {
    let source = r#"
        void f(int n, int *rowptr, double *val) {
            for (int i = 0; i < n; i++)
                for (int k = rowptr[i]; k < rowptr[i + 1]; k++)
                    rowptr[i] = 0;
        }
    "#;
    let err = build_err(source, &BuilderConfig::default());
    assert_eq!(err.kind, BuildErrorKind::InvariantViolation);
    assert_eq!(err.message, "Code may not modify loop-invariant data space 'rowptr'");
    assert_eq!(err.source_text, "rowptr[i]");

    let err = build_err(
        "void f(int n) { for (int i = 0; i < n; i++) n = 0; }",
        &BuilderConfig::default(),
    );
    assert_eq!(err.kind, BuildErrorKind::InvariantViolation);

    // bare scalars are not data spaces when ignored
    let ok = build_computations(
        "void f(int n) { for (int i = 0; i < n; i++) n = 0; }",
        &BuilderConfig::default().scalars(ScalarPolicy::Ignore),
    );
    assert!(ok.is_ok());
}

#[test]
fn test_sparse_matrix_vector() {
    let source = r#"
        void spmv(int n, int *rowptr, int *col, double *val, double *x, double *y) {
            for (int i = 0; i < n; i++)
                for (int k = rowptr[i]; k < rowptr[i + 1]; k++)
                    y[i] += val[k] * x[col[k]];
        }
    "#;
    let computation = build_one(source, &BuilderConfig::default());
    check(
        &computation,
        &[Expected {
            space: "{[i,k]: 0 <= i and i < n and rowptr(i) <= k and k < rowptr(i + 1)}",
            schedule: "{[i,k]->[0,i,0,k,0]}",
            reads: &[
                ("y", "{[i,k]->[i]}"),
                ("val", "{[i,k]->[k]}"),
                ("x", "{[i,k]->[_r0]: _r0 = col(k)}"),
                ("col", "{[i,k]->[k]}"),
            ],
            writes: &[("y", "{[i,k]->[i]}")],
        }],
    );
    assert!(computation.statements[0].reads[2].is_indirect());
}

#[test]
fn test_iterator_assignment_in_body_fails() {
    let source = r#"
        void f(int n, int a[n]) {
            for (int i = 0; i < n; i++) {
                i = i + 1;
                a[i] = 0;
            }
        }
    "#;
    for config in [BuilderConfig::default(), BuilderConfig::default().scalars(ScalarPolicy::Ignore)] {
        let err = build_err(source, &config);
        assert_eq!(err.kind, BuildErrorKind::InvariantViolation);
        assert_eq!(err.message, "Code may not modify loop iterator 'i'");
    }
}

#[test]
fn test_non_affine_subscripts() {
    let source = r#"
        void f(int n, int a[n]) {
            for (int i = 0; i < n; i++)
                for (int j = 0; j < n; j++)
                    a[i * j] = a[i / 2] + a[2 * j + 1];
        }
    "#;
    let computation = build_one(source, &BuilderConfig::default());
    let stmt = &computation.statements[0];
    assert_eq!(relations(&stmt.writes), pairs(&[("a", "{[i,j]->[_r0]: _r0 = i * j}")]));
    assert_eq!(
        relations(&stmt.reads),
        pairs(&[("a", "{[i,j]->[_r1]: _r1 = i / 2}"), ("a", "{[i,j]->[2 * j + 1]}")])
    );
}

#[test]
fn test_unsupported_constructs() {
    let cases = [
        "void f(int n) { while (n > 0) n = n - 1; }",
        "void f(int n) { switch (n) { case 0: n = 1; } }",
        "void f(int n, int a[n]) { for (int i = 0; i < n; i++) { if (a[i] > 0) return; } }",
        "void f(int n) { compute(n); }",
        "void f(int n) { [[likely]] n = 0; }",
    ];
    for source in cases {
        let err = build_err(source, &BuilderConfig::default());
        assert_eq!(err.kind, BuildErrorKind::UnsupportedConstruct, "{}", source);
        assert!(err.message.starts_with("Unsupported stmt type "), "{}", err.message);
    }
}

#[test]
fn test_branch_conditions() {
    let err = build_err(
        "void f(int n, int a[n]) { for (int i = 0; i < n; i++) if (a[i] && n) a[i] = 0; }",
        &BuilderConfig::default(),
    );
    assert_eq!(err.kind, BuildErrorKind::MalformedBranchCondition);
    assert_eq!(err.message, "If statement condition must be a binary comparison");

    let err = build_err(
        "void f(int n, int a[n]) { for (int i = 0; i < n; i++) if (a[i] != 0) a[i] = 0; }",
        &BuilderConfig::default(),
    );
    assert_eq!(err.kind, BuildErrorKind::MalformedBranchCondition);
}

#[test]
fn test_else_policies() {
    let source = r#"
        void relu(int n, double a[n], double b[n]) {
            for (int i = 0; i < n; i++) {
                if (a[i] >= 0)
                    b[i] = a[i];
                else
                    b[i] = 0;
            }
        }
    "#;
    let computation = build_one(source, &BuilderConfig::default());
    let spaces: Vec<_> = computation
        .statements
        .iter()
        .map(|s| s.iteration_space.to_string())
        .collect();
    assert_eq!(
        spaces,
        vec![
            "{[i]: 0 <= i and i < n and a(i) >= 0}",
            "{[i]: 0 <= i and i < n and a(i) < 0}",
        ]
    );

    let err = build_err(source, &BuilderConfig::without_else());
    assert_eq!(err.kind, BuildErrorKind::UnsupportedConstruct);
}

#[test]
fn test_equality_branch_else() {
    let source = "void f(int n, int a[n]) { for (int i = 0; i < n; i++) { if (i == 0) a[i] = 1; else a[i] = 2; } }";
    let err = build_err(source, &BuilderConfig::default());
    assert_eq!(err.kind, BuildErrorKind::MalformedBranchCondition);

    let computation = build_one(source, &BuilderConfig::default().allow_not_equal(true));
    assert_eq!(
        computation.statements[1].iteration_space.to_string(),
        "{[i]: 0 <= i and i < n and i != 0}"
    );
}

#[test]
fn test_hoisted_condition_declaration() {
    let source = r#"
        void f(int n, int a[n]) {
            for (int i = 0; i < n; i++)
                if (int t = a[i]; t > 0)
                    a[i] = t;
        }
    "#;
    let err = build_err(source, &BuilderConfig::default());
    assert_eq!(err.kind, BuildErrorKind::MalformedBranchCondition);

    let config = BuilderConfig::default().condition_decls(ConditionDeclPolicy::Hoist);
    let computation = build_one(source, &config);
    assert_eq!(computation.num_stmts(), 2);
    assert_eq!(computation.statements[0].execution_schedule.to_string(), "{[i]->[0,i,0]}");
    assert_eq!(computation.statements[1].execution_schedule.to_string(), "{[i]->[0,i,1]}");
    assert_eq!(
        computation.statements[1].iteration_space.to_string(),
        "{[i]: 0 <= i and i < n and t > 0}"
    );
}

#[test]
fn test_schedules_are_monotonic_and_complete() {
    let sources = [MATRIX_ADD, FORWARD_SOLVE];
    for source in sources {
        let computation = build_one(source, &BuilderConfig::default());
        assert!(computation.is_complete());
        let dim = computation.schedule_dimension().unwrap();
        for window in computation.statements.windows(2) {
            let (a, b) = (&window[0].execution_schedule, &window[1].execution_schedule);
            assert_eq!(a.dimension(), dim);
            assert_eq!(
                a.schedule.compare_literal_prefix(&b.schedule),
                Some(Ordering::Less),
                "{} should run before {}",
                window[0].source,
                window[1].source
            );
        }
    }
}

#[test]
fn test_nested_blocks_and_empty_statements() {
    let source = r#"
        void f(int n, int a[n]) {
            {
                int s = 0;
                ;
            }
            for (int i = 0; i < n; i++) {
                { a[i] = i; }
            }
        }
    "#;
    let computation = build_one(source, &BuilderConfig::default());
    let schedules: Vec<_> = computation
        .statements
        .iter()
        .map(|s| s.execution_schedule.to_string())
        .collect();
    assert_eq!(schedules, vec!["{[]->[0,0,0]}", "{[]->[1,0,0]}", "{[i]->[2,i,0]}"]);
}

#[test]
fn test_json_output() {
    let computation = build_one(MATRIX_ADD, &BuilderConfig::default());
    let json = computations_to_json(&[computation]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["statements"].as_array().map(|s| s.len()), Some(3));
    assert_eq!(
        value[0]["statements"][2]["iteration_space"],
        "{[i,j]: 0 <= i and i < a and 0 <= j and j < b}"
    );
}
