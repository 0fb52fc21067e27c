//! End-to-end scenarios: manifests on disk, through an index source and the
//! resolver, to a located file.

use classmap_core::index::IndexError;
use classmap_core::{IndexSource, ResolveError, Resolver, Services};
use classmap_test_utils::fixture::memory_services;
use classmap_test_utils::{ProjectFixture, RecordingHost};
use pretty_assertions::assert_eq;

fn resolver_for(projects: &[&ProjectFixture]) -> Resolver {
    let services = Services::in_memory();
    let mut resolver = Resolver::new(services.clone());
    for project in projects {
        assert!(resolver.add_source(&project.source(&services)).unwrap());
    }
    resolver
}

fn dao_project(cluster_path: &str) -> ProjectFixture {
    let project = ProjectFixture::new();
    project.files(&[
        "config/models/UserDao.ext",
        "config/models/OrderDao.ext",
        "config/models/.hidden.ext",
        "config/models/.HiddenDao.ext",
        "config/models/nested/CartDao.ext",
    ]);
    project.config_manifest(&format!(
        r#"<cluster path="{cluster_path}"><class name="*Dao" file="*Dao.ext"/></cluster>"#
    ));
    project
}

fn sorted_symbols(source: &IndexSource) -> Vec<String> {
    let mut symbols: Vec<String> = source.mapping().unwrap().keys().cloned().collect();
    symbols.sort();
    symbols
}

#[test]
fn test_literal_rule_locates_in_any_case() {
    let project = ProjectFixture::new();
    project.files(&["libs/auth/AuthService.ext"]);
    project.config_manifest(
        r#"<cluster path="/libs/auth"><class name="AuthService" file="AuthService.ext"/></cluster>"#,
    );

    let resolver = resolver_for(&[&project]);
    let expected = project.path("libs/auth/AuthService.ext");
    assert_eq!(resolver.locate("authservice"), Some(expected.as_path()));
    assert_eq!(resolver.locate("AUTHSERVICE"), Some(expected.as_path()));
    assert_eq!(resolver.locate("AuthService"), Some(expected.as_path()));
}

#[test]
fn test_pattern_rule_non_recursive() {
    let project = dao_project("models");
    let source = project.source(&Services::in_memory());

    assert_eq!(sorted_symbols(&source), vec!["ORDERDAO", "USERDAO"]);
    assert_eq!(
        source.mapping().unwrap().get("USERDAO"),
        Some(&project.path("config/models/UserDao.ext"))
    );
}

#[test]
fn test_pattern_rule_recursive() {
    let project = dao_project("models/...");
    let source = project.source(&Services::in_memory());

    assert_eq!(sorted_symbols(&source), vec!["CARTDAO", "ORDERDAO", "USERDAO"]);
    assert_eq!(
        source.mapping().unwrap().get("CARTDAO"),
        Some(&project.path("config/models/nested/CartDao.ext"))
    );
}

#[test]
fn test_fallback_chain_runs_in_order() {
    let project = ProjectFixture::new();
    project.config_manifest(
        r#"<autoload class="A" method="load"/>
           <autoload class="B" method="load"/>"#,
    );
    let resolver = resolver_for(&[&project]);

    let host = RecordingHost::new()
        .answer("A", "load", false)
        .answer("B", "load", true);
    assert!(resolver.load("Unknown", &host).unwrap());
    assert_eq!(
        host.calls(),
        vec![
            ("A".to_string(), "load".to_string(), "UNKNOWN".to_string()),
            ("B".to_string(), "load".to_string(), "UNKNOWN".to_string()),
        ]
    );
    assert!(host.includes().is_empty());

    let host = RecordingHost::new()
        .answer("A", "load", false)
        .answer("B", "load", false);
    assert!(!resolver.load("Unknown", &host).unwrap());
    assert_eq!(host.calls().len(), 2);
}

#[test]
fn test_missing_autoload_method_is_schema_error() {
    let project = ProjectFixture::new();
    project.config_manifest(r#"<autoload class="X"/>"#);

    let services = Services::in_memory();
    let mut resolver = Resolver::new(services.clone());
    let err = resolver.add_source(&project.source(&services)).unwrap_err();

    match err {
        ResolveError::Index(IndexError::ManifestSchema {
            path,
            element,
            attribute,
        }) => {
            assert_eq!(path, project.path("config/includepath.xml"));
            assert_eq!(element, "autoload");
            assert_eq!(attribute, "method");
        }
        other => panic!("expected schema error, got {other:?}"),
    }
    assert!(resolver.is_empty());
    assert_eq!(resolver.sources().count(), 0);
}

#[test]
fn test_first_registered_source_wins() {
    let a = ProjectFixture::new();
    let b = ProjectFixture::new();
    for project in [&a, &b] {
        project.files(&["foo.ext"]);
        project.config_manifest(r#"<cluster path="/"><class name="Foo" file="foo.ext"/></cluster>"#);
    }

    let resolver = resolver_for(&[&a, &b]);
    assert_eq!(resolver.locate("foo"), Some(a.path("foo.ext").as_path()));

    let resolver = resolver_for(&[&b, &a]);
    assert_eq!(resolver.locate("foo"), Some(b.path("foo.ext").as_path()));
}

#[test]
fn test_libs_manifests_and_config_combine() {
    let project = ProjectFixture::new();
    project.files(&[
        "libs/auth/AuthService.ext",
        "libs/billing/Invoice.ext",
        "overrides/AuthService.ext",
    ]);
    project.manifest(
        "libs/auth",
        r#"<cluster path=""><class name="AuthService" file="AuthService.ext"/></cluster>
           <classpath path="libs/auth/vendor"/>"#,
    );
    project.manifest(
        "libs/billing",
        r#"<cluster path=""><interface name="Invoice" file="Invoice.ext"/></cluster>
           <autoload class="Billing" method="autoload"/>"#,
    );
    project.config_manifest(
        r#"<cluster path="/overrides"><class name="AuthService" file="AuthService.ext"/></cluster>
           <classpath path="shared"/>"#,
    );

    let source = project.source(&Services::in_memory());
    let tables = source.tables().unwrap();

    // config is applied last, so its literal replaces the library's
    assert_eq!(
        tables.mapping.get("AUTHSERVICE"),
        Some(&project.path("overrides/AuthService.ext"))
    );
    assert_eq!(
        tables.mapping.get("INVOICE"),
        Some(&project.path("libs/billing/Invoice.ext"))
    );
    assert_eq!(tables.classpaths, vec!["libs/auth/vendor", "shared"]);
    assert_eq!(
        tables.autoloaders.get("Billing").map(String::as_str),
        Some("autoload")
    );
}

#[test]
fn test_pattern_does_not_replace_literal() {
    let project = ProjectFixture::new();
    project.files(&["lib/UserDao.ext", "special/UserDao.ext"]);
    project.config_manifest(
        r#"<cluster path="/special"><class name="UserDao" file="UserDao.ext"/></cluster>
           <cluster path="/lib"><class name="*Dao" file="*Dao.ext"/></cluster>"#,
    );

    let (services, _) = memory_services(false);
    let source = project.source(&services);
    assert_eq!(
        source.mapping().unwrap().get("USERDAO"),
        Some(&project.path("special/UserDao.ext"))
    );
}
