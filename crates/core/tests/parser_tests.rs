//! End-to-end tests for the DSL parser: grammar productions, identifier
//! registration, views, styles, and error provenance.

use blueprint_core::{DslParser, ParseError, ParserListener};
use blueprint_model::{
    ElementKind, FilterMode, ImpliedRelationships, Location, RankDirection, Role, Shape, ViewKind,
    Workspace,
};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

fn parse(dsl: &str) -> Workspace {
    let mut parser = DslParser::new();
    parser.parse_str(dsl).expect("parse should succeed");
    parser.into_workspace().expect("workspace should exist")
}

fn parse_err(dsl: &str) -> ParseError {
    let mut parser = DslParser::new();
    parser
        .parse_str(dsl)
        .expect_err("parse should fail")
}

const MINIMAL: &str = r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S"
        u -> s "Uses"
    }
    views {
        systemContext s "c" {
            include *
            autoLayout
        }
    }
}"#;

#[test]
fn minimal_workspace() {
    let ws = parse(MINIMAL);

    let u = ws.model.find_person("User").expect("person");
    let s = ws.model.find_software_system("S").expect("system");
    assert_eq!(ws.model.relationships().count(), 1);
    let r = ws.model.relationships().next().unwrap();
    assert_eq!(r.source, u);
    assert_eq!(r.destination, s);
    assert_eq!(r.description, "Uses");

    let view = ws.views.view("c").expect("view");
    assert_eq!(view.kind, ViewKind::SystemContext { software_system: s });
    assert!(view.contains_element(u));
    assert!(view.contains_element(s));
    assert_eq!(view.relationships.len(), 1);
    assert!(view.auto_layout.is_some());
}

#[test]
fn assignments_register_elements_and_relationships() {
    let mut parser = DslParser::new();
    parser
        .parse_str(
            r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S"
        rel = u -> s "Uses"
    }
}"#,
        )
        .unwrap();

    let register = parser.identifiers_register();
    let u = register.element("u").expect("u registered");
    let s = register.element("s").expect("s registered");
    let rel = register.relationship("rel").expect("rel registered");

    let ws = parser.workspace().unwrap();
    assert_eq!(ws.model.element(u).name, "User");
    assert_eq!(ws.model.element(s).name, "S");
    assert_eq!(ws.model.relationship(rel).description, "Uses");
}

#[test]
fn identifier_lookup_is_case_insensitive() {
    let mut parser = DslParser::new();
    parser
        .parse_str(
            r#"workspace {
    model {
        FOO = person "User"
    }
}"#,
        )
        .unwrap();
    let register = parser.identifiers_register();
    assert_eq!(register.element("FOO"), register.element("foo"));
    assert!(register.element("foo").is_some());
}

#[test]
fn hierarchical_identifiers() {
    let mut parser = DslParser::new();
    parser
        .parse_str(
            r#"workspace {
    !identifiers hierarchical
    model {
        ss = softwareSystem "S" {
            web = container "W"
        }
    }
}"#,
        )
        .unwrap();
    let register = parser.identifiers_register();
    let ss = register.element("ss").expect("ss");
    let web = register.element("ss.web").expect("ss.web");
    let ws = parser.workspace().unwrap();
    assert!(matches!(
        ws.model.element(ss).kind,
        ElementKind::SoftwareSystem { .. }
    ));
    assert_eq!(ws.model.element(web).kind, ElementKind::Container);
    assert_eq!(ws.model.element(web).parent, Some(ss));
}

#[test]
fn hierarchical_deployment_node_keys_include_the_environment() {
    let mut parser = DslParser::new();
    parser
        .parse_str(
            r#"workspace {
    !identifiers hierarchical
    model {
        live = deploymentEnvironment "Live" {
            node1 = deploymentNode "Server" {
                node2 = deploymentNode "Docker"
            }
        }
    }
}"#,
        )
        .unwrap();
    let register = parser.identifiers_register();
    assert!(register.element("live.node1").is_some());
    assert!(register.element("live.node1.node2").is_some());
}

#[test]
fn constant_substitution() {
    let ws = parse(
        r#"workspace {
    model {
        !constant NAME "Acme"
        softwareSystem "${NAME} System"
    }
}"#,
    );
    assert!(ws.model.find_software_system("Acme System").is_some());
}

#[test]
fn undefined_substitution_stays_literal_in_restricted_mode() {
    let mut parser = DslParser::new();
    parser.set_restricted(true);
    parser
        .parse_str(
            r#"workspace {
    model {
        softwareSystem "${BLUEPRINT_UNDEFINED_CONSTANT}"
    }
}"#,
        )
        .unwrap();
    let ws = parser.workspace().unwrap();
    assert!(ws
        .model
        .find_software_system("${BLUEPRINT_UNDEFINED_CONSTANT}")
        .is_some());
}

#[test]
fn quoted_exclude_expression_is_accepted() {
    let ws = parse(
        r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S" {
            tags "External"
        }
        u -> s "Uses"
    }
    views {
        systemContext s "c" {
            include *
            exclude "* -> element.tag==External"
        }
    }
}"#,
    );
    let view = ws.views.view("c").unwrap();
    // the u -> s relationship matched the expression and was removed
    assert!(view.relationships.is_empty());
}

#[test]
fn unquoted_exclude_expression_is_rejected() {
    let err = parse_err(
        r#"workspace {
    model {
        s = softwareSystem "S"
    }
    views {
        systemContext s "c" {
            include *
            exclude * -> element.tag==External
        }
    }
}"#,
    );
    assert_eq!(err.message, "Unexpected tokens");
}

#[test]
fn error_provenance_has_line_and_source() {
    let err = parse_err(
        r#"workspace {
    mdel {
    }
}"#,
    );
    assert_eq!(err.message, "Unexpected tokens");
    assert_eq!(err.line_number, Some(2));
    assert_eq!(err.source_line.as_deref(), Some("mdel {"));
}

#[test]
fn unterminated_string_fails_with_provenance() {
    let err = parse_err(
        r#"workspace {
    model {
        person "User
    }
}"#,
    );
    assert_eq!(err.message, "Unterminated string literal");
    assert_eq!(err.line_number, Some(3));
}

#[test]
fn echoed_dsl_reparses_to_an_equivalent_workspace() {
    let mut parser = DslParser::new();
    parser.parse_str(MINIMAL).unwrap();
    let first = parser.workspace().unwrap().clone();
    let dsl = first.dsl.clone().expect("echoed dsl");

    let mut second_parser = DslParser::new();
    second_parser.parse_str(&dsl).unwrap();
    let second = second_parser.workspace().unwrap();

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(second).unwrap()
    );
}

#[test]
fn unexpected_end_of_context() {
    let err = parse_err("}");
    assert_eq!(err.message, "Unexpected end of context");
}

#[test]
fn comments_are_skipped() {
    let ws = parse(
        r#"// leading comment
# hash comment
workspace {
    /* single-line block */
    model {
        /*
           a multi-line comment
           person "NotCreated"
        */
        person "User"
    }
}"#,
    );
    assert_eq!(ws.model.elements().count(), 1);
    assert!(ws.model.find_person("User").is_some());
}

#[test]
fn enterprise_marks_unplaced_elements_external() {
    let ws = parse(
        r#"workspace {
    model {
        customer = person "Customer"
        enterprise "Acme" {
            staff = person "Staff"
            s = softwareSystem "S"
        }
    }
}"#,
    );
    assert_eq!(ws.model.enterprise.as_deref(), Some("Acme"));
    let customer = ws.model.find_person("Customer").unwrap();
    let staff = ws.model.find_person("Staff").unwrap();
    let s = ws.model.find_software_system("S").unwrap();
    assert_eq!(ws.model.element(customer).location(), Location::External);
    assert_eq!(ws.model.element(staff).location(), Location::Internal);
    assert_eq!(ws.model.element(s).location(), Location::Internal);
}

#[test]
fn groups_record_membership_and_reject_nesting() {
    let ws = parse(
        r#"workspace {
    model {
        group "Vendors" {
            v = softwareSystem "Vendor System"
        }
    }
}"#,
    );
    let v = ws.model.find_software_system("Vendor System").unwrap();
    assert_eq!(ws.model.element(v).group.as_deref(), Some("Vendors"));

    let err = parse_err(
        r#"workspace {
    model {
        group "Outer" {
            group "Inner" {
            }
        }
    }
}"#,
    );
    assert_eq!(err.message, "Unexpected tokens");
}

#[test]
fn implied_relationships_directive_installs_strategy() {
    let ws = parse(
        r#"workspace {
    model {
        !impliedRelationships true
        a = softwareSystem "A" {
            a1 = container "A1"
        }
        b = softwareSystem "B"
        a1 -> b "Uses"
    }
}"#,
    );
    assert_eq!(
        ws.model.implied_relationships,
        ImpliedRelationships::CreateUnlessAnyExist
    );
    let a = ws.model.find_software_system("A").unwrap();
    let b = ws.model.find_software_system("B").unwrap();
    assert!(ws.model.has_relationship_between(a, b));
}

#[test]
fn legacy_implied_relationships_spelling_is_accepted_and_last_wins() {
    let ws = parse(
        r#"workspace {
    model {
        !impliedRelationships true
        impliedRelationships false
    }
}"#,
    );
    assert_eq!(
        ws.model.implied_relationships,
        ImpliedRelationships::DoNotCreate
    );
}

#[test]
fn deployment_topology_with_instances_and_health_checks() {
    let ws = parse(
        r#"workspace {
    model {
        s = softwareSystem "S" {
            web = container "Web"
        }
        deploymentEnvironment "Live" {
            dn = deploymentNode "Server" "A server" "Ubuntu" {
                lb = infrastructureNode "Load Balancer"
                ci = containerInstance web {
                    healthCheck "HTTP" "https://example.com/health" 120 1000
                }
                ssi = softwareSystemInstance s
            }
        }
    }
}"#,
    );
    let node = ws
        .model
        .elements()
        .find(|e| matches!(e.kind, ElementKind::DeploymentNode { .. }))
        .unwrap();
    assert_eq!(node.name, "Server");
    assert_eq!(node.technology.as_deref(), Some("Ubuntu"));

    let instance = ws
        .model
        .elements()
        .find(|e| matches!(e.kind, ElementKind::ContainerInstance { .. }))
        .unwrap();
    match &instance.kind {
        ElementKind::ContainerInstance {
            instance,
            health_checks,
            ..
        } => {
            assert_eq!(*instance, 1);
            assert_eq!(health_checks.len(), 1);
            assert_eq!(health_checks[0].name, "HTTP");
            assert_eq!(health_checks[0].interval, 120);
            assert_eq!(health_checks[0].timeout, 1000);
        }
        _ => unreachable!(),
    }
    assert!(ws
        .model
        .elements()
        .any(|e| matches!(e.kind, ElementKind::SoftwareSystemInstance { .. })));
    assert!(ws
        .model
        .elements()
        .any(|e| matches!(e.kind, ElementKind::InfrastructureNode { .. })));
}

#[test]
fn dynamic_view_steps_are_ordered_and_parallel_sequences_share_indices() {
    let ws = parse(
        r#"workspace {
    model {
        a = softwareSystem "A"
        b = softwareSystem "B"
        c = softwareSystem "C"
        a -> b "Asks"
        b -> c "Forwards"
        c -> b "Replies"
    }
    views {
        dynamic * "d" {
            a -> b "Asks"
            {
                b -> c "Forwards"
                c -> b "Replies"
            }
            autoLayout
        }
    }
}"#,
    );
    let view = ws.views.view("d").unwrap();
    let orders: Vec<String> = view
        .relationships
        .iter()
        .map(|rv| rv.order.clone().unwrap())
        .collect();
    assert_eq!(orders, vec!["1", "2", "3"]);
    assert_eq!(view.elements.len(), 3);
}

#[test]
fn dynamic_view_relationship_must_exist_in_the_model() {
    let err = parse_err(
        r#"workspace {
    model {
        a = softwareSystem "A"
        b = softwareSystem "B"
    }
    views {
        dynamic * "d" {
            a -> b "Asks"
        }
    }
}"#,
    );
    assert!(err.message.contains("does not exist"), "{}", err.message);
}

#[test]
fn animation_steps_collect_elements_in_order() {
    let ws = parse(
        r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S"
        u -> s "Uses"
    }
    views {
        systemContext s "c" {
            include *
            animation {
                s
                u
            }
        }
    }
}"#,
    );
    let view = ws.views.view("c").unwrap();
    assert_eq!(view.animations.len(), 2);
    assert_eq!(view.animations[0].order, 1);
    assert_eq!(view.animations[1].order, 2);
}

#[test]
fn auto_layout_directions_are_validated() {
    let ws = parse(
        r#"workspace {
    model {
        s = softwareSystem "S"
    }
    views {
        systemContext s "c" {
            autoLayout lr 100 200
        }
    }
}"#,
    );
    let layout = ws.views.view("c").unwrap().auto_layout.clone().unwrap();
    assert_eq!(layout.rank_direction, RankDirection::LeftRight);
    assert_eq!(layout.rank_separation, 100);
    assert_eq!(layout.node_separation, 200);

    let err = parse_err(
        r#"workspace {
    model {
        s = softwareSystem "S"
    }
    views {
        systemContext s "c" {
            autoLayout diagonal
        }
    }
}"#,
    );
    assert_eq!(err.message, "Valid directions are: tb|bt|lr|rl");
}

#[test]
fn element_styles_are_parsed_and_colors_validated() {
    let ws = parse(
        r#"workspace {
    views {
        styles {
            element "Person" {
                shape Person
                background #08427b
                color #ffffff
                fontSize 22
                metadata false
            }
            relationship "Relationship" {
                dashed true
                thickness 2
            }
        }
    }
}"#,
    );
    let style = &ws.views.styles.elements[0];
    assert_eq!(style.tag, "Person");
    assert_eq!(style.shape, Some(Shape::Person));
    assert_eq!(style.background.as_deref(), Some("#08427b"));
    assert_eq!(style.font_size, Some(22));
    assert_eq!(style.metadata, Some(false));
    let rel_style = &ws.views.styles.relationships[0];
    assert_eq!(rel_style.dashed, Some(true));
    assert_eq!(rel_style.thickness, Some(2));

    let err = parse_err(
        r#"workspace {
    views {
        styles {
            element "Person" {
                background red
            }
        }
    }
}"#,
    );
    assert_eq!(err.message, "'red' is not a valid hex colour code");
}

#[test]
fn terminology_branding_users_and_themes() {
    let ws = parse(
        r#"workspace {
    configuration {
        users {
            alice write
            bob read
        }
    }
    views {
        branding {
            logo "logo.png"
            font "Open Sans" "https://fonts.example.com/open-sans"
        }
        terminology {
            person "Actor"
            softwareSystem "Application"
        }
        theme default
        themes "https://example.com/theme.json"
    }
}"#,
    );
    assert_eq!(ws.configuration.users.get("alice"), Some(&Role::ReadWrite));
    assert_eq!(ws.configuration.users.get("bob"), Some(&Role::ReadOnly));
    assert_eq!(ws.views.branding.logo.as_deref(), Some("logo.png"));
    assert_eq!(
        ws.views.branding.font.as_ref().map(|f| f.name.as_str()),
        Some("Open Sans")
    );
    assert_eq!(ws.views.terminology.person.as_deref(), Some("Actor"));
    assert_eq!(
        ws.views.terminology.software_system.as_deref(),
        Some("Application")
    );
    assert_eq!(ws.views.themes.len(), 2);
    assert!(ws.views.themes[0].contains("/themes/default/"));
}

#[test]
fn filtered_views_reference_a_base_view() {
    let ws = parse(
        r#"workspace {
    model {
        s = softwareSystem "S"
    }
    views {
        systemLandscape "landscape" {
            include *
        }
        filtered "landscape" exclude "External" "internal-only"
    }
}"#,
    );
    assert_eq!(ws.views.filtered.len(), 1);
    let filtered = &ws.views.filtered[0];
    assert_eq!(filtered.base_key, "landscape");
    assert_eq!(filtered.mode, FilterMode::Exclude);
    assert_eq!(filtered.tags, vec!["External"]);
    assert_eq!(filtered.key, "internal-only");
}

#[test]
fn duplicate_view_keys_are_rejected() {
    let err = parse_err(
        r#"workspace {
    model {
        s = softwareSystem "S"
    }
    views {
        systemContext s "c" {
        }
        systemContext s "c" {
        }
    }
}"#,
    );
    assert!(err.message.contains("already exists"), "{}", err.message);
    assert_eq!(err.line_number, Some(8));
}

#[test]
fn duplicate_identifiers_are_rejected() {
    let err = parse_err(
        r#"workspace {
    model {
        x = person "P"
        x = softwareSystem "S"
    }
}"#,
    );
    assert_eq!(err.message, "The identifier \"x\" is already in use");
}

#[test]
fn invalid_identifier_names_are_rejected() {
    let err = parse_err(
        r#"workspace {
    model {
        my-name = person "P" "desc"
    }
}"#,
    );
    assert!(
        err.message.contains("Identifiers can only contain"),
        "{}",
        err.message
    );
}

#[test]
fn properties_and_perspectives_blocks() {
    let ws = parse(
        r#"workspace {
    model {
        s = softwareSystem "S" {
            properties {
                owner "Team A"
            }
            perspectives {
                security "TLS everywhere"
            }
        }
    }
}"#,
    );
    let s = ws.model.find_software_system("S").unwrap();
    let element = ws.model.element(s);
    assert_eq!(element.properties.get("owner").map(String::as_str), Some("Team A"));
    assert_eq!(
        element.perspectives.get("security").map(String::as_str),
        Some("TLS everywhere")
    );
}

#[test]
fn model_item_mutators_inside_element_blocks() {
    let ws = parse(
        r#"workspace {
    model {
        s = softwareSystem "S" {
            description "A system"
            url "https://example.com"
            tags "Tag One" "Tag Two"
            web = container "Web" {
                technology "Rust"
            }
        }
    }
}"#,
    );
    let s = ws.model.find_software_system("S").unwrap();
    let element = ws.model.element(s);
    assert_eq!(element.description.as_deref(), Some("A system"));
    assert_eq!(element.url.as_deref(), Some("https://example.com"));
    assert!(element.has_tag("Tag One"));
    assert!(element.has_tag("Tag Two"));
    let web = ws.model.find_by_canonical_name("Container://S/Web").unwrap();
    assert_eq!(ws.model.element(web).technology.as_deref(), Some("Rust"));
}

#[test]
fn implicit_relationships_use_the_enclosing_element_as_source() {
    let ws = parse(
        r#"workspace {
    model {
        db = softwareSystem "Database"
        s = softwareSystem "S" {
            -> db "Reads from" "SQL" "Query"
        }
    }
}"#,
    );
    let s = ws.model.find_software_system("S").unwrap();
    let db = ws.model.find_software_system("Database").unwrap();
    let r = ws.model.relationships().next().unwrap();
    assert_eq!(r.source, s);
    assert_eq!(r.destination, db);
    assert_eq!(r.technology.as_deref(), Some("SQL"));
    assert!(r.has_tag("Query"));
}

#[test]
fn ref_extends_an_element_defined_earlier() {
    let ws = parse(
        r#"workspace {
    model {
        s = softwareSystem "S"
        !ref s {
            web = container "Web"
        }
    }
}"#,
    );
    let s = ws.model.find_software_system("S").unwrap();
    let web = ws.model.find_by_canonical_name("Container://S/Web").unwrap();
    assert_eq!(ws.model.element(web).parent, Some(s));
}

#[test]
fn ref_to_a_missing_element_fails() {
    let err = parse_err(
        r#"workspace {
    model {
        !ref missing {
        }
    }
}"#,
    );
    assert!(
        err.message.contains("could not be found"),
        "{}",
        err.message
    );
}

#[test]
fn restricted_mode_rejects_plugins_and_scripts() {
    let mut parser = DslParser::new();
    parser.set_restricted(true);
    let err = parser
        .parse_str("workspace {\n    !plugin com.example.Plugin\n}")
        .unwrap_err();
    assert_eq!(err.message, "Plugins are not available");

    let mut parser = DslParser::new();
    parser.set_restricted(true);
    let err = parser
        .parse_str("workspace {\n    !script groovy {\n}")
        .unwrap_err();
    assert_eq!(err.message, "Scripts are not available");
}

#[test]
fn scripts_without_an_engine_fail_at_frame_close() {
    let err = parse_err(
        r#"workspace {
    !script groovy {
        workspace.model
    }
}"#,
    );
    assert!(
        err.message.contains("no script engine is installed"),
        "{}",
        err.message
    );
}

#[test]
fn docs_are_a_no_op_without_an_importer() {
    // the directive parses; importing is the embedder's concern
    let ws = parse(
        r#"workspace {
    !docs docs
    model {
        s = softwareSystem "S"
    }
}"#,
    );
    assert!(ws.model.find_software_system("S").is_some());
}

#[derive(Default)]
struct Counts {
    views: usize,
    relationships: usize,
    elements: usize,
    colors: usize,
    context_ends: usize,
}

struct CountingListener(Rc<RefCell<Counts>>);

impl ParserListener for CountingListener {
    fn on_parsed_view(&mut self, _file: &Path, _line: u32, _key: &str) {
        self.0.borrow_mut().views += 1;
    }
    fn on_parsed_relationship(
        &mut self,
        _file: &Path,
        _line: u32,
        _identifier: Option<&str>,
        _relationship: blueprint_model::RelationshipId,
    ) {
        self.0.borrow_mut().relationships += 1;
    }
    fn on_parsed_model_element(
        &mut self,
        _file: &Path,
        _line: u32,
        _identifier: Option<&str>,
        _element: blueprint_model::ElementId,
    ) {
        self.0.borrow_mut().elements += 1;
    }
    fn on_parsed_color(&mut self, _file: &Path, _line: u32) {
        self.0.borrow_mut().colors += 1;
    }
    fn on_end_context(&mut self, _file: &Path, _line: u32, _context: &str) {
        self.0.borrow_mut().context_ends += 1;
    }
}

#[test]
fn listener_receives_progress_callbacks() {
    let counts = Rc::new(RefCell::new(Counts::default()));
    let mut parser = DslParser::new();
    parser.set_listener(Box::new(CountingListener(counts.clone())));
    parser
        .parse_str(
            r#"workspace {
    model {
        u = person "User"
        s = softwareSystem "S"
        u -> s "Uses"
    }
    views {
        systemContext s "c" {
            include *
        }
        styles {
            element "Person" {
                background #08427b
            }
        }
    }
}"#,
        )
        .unwrap();
    let counts = counts.borrow();
    assert_eq!(counts.elements, 2);
    assert_eq!(counts.relationships, 1);
    assert_eq!(counts.views, 1);
    assert_eq!(counts.colors, 1);
    // workspace, model, views, view, styles, element style
    assert_eq!(counts.context_ends, 6);
}

#[test]
fn workspace_name_and_description() {
    let ws = parse(
        r#"workspace "Big Bank" "An example workspace" {
    model {
    }
}"#,
    );
    assert_eq!(ws.name, "Big Bank");
    assert_eq!(ws.description, "An example workspace");

    let ws = parse(
        r#"workspace {
    name "Renamed"
    description "Updated"
}"#,
    );
    assert_eq!(ws.name, "Renamed");
    assert_eq!(ws.description, "Updated");
}

#[test]
fn empty_fragment_is_rejected() {
    let mut parser = DslParser::new();
    let err = parser.parse_str("   \n \n").unwrap_err();
    assert_eq!(err.message, "A DSL fragment must be specified");
}

#[test]
fn keywords_are_case_insensitive() {
    let ws = parse(
        r#"WORKSPACE {
    MODEL {
        u = PERSON "User"
    }
}"#,
    );
    assert!(ws.model.find_person("User").is_some());
}

#[test]
fn wrong_context_is_an_error() {
    // container outside a software system block
    let err = parse_err(
        r#"workspace {
    model {
        container "Web"
    }
}"#,
    );
    assert_eq!(err.message, "Unexpected tokens");
}
