use logic_dfg::dfg::{Bits, Context, DType, DumpConfig, Graph, Loc, SourceType, Vertex, VertexType};

fn setup() -> (Context, Graph, Vertex) {
    let mut ctx = Context::new("top");
    let g = Graph::new(&mut ctx, "comb");
    let x = ctx.declare_var("x", &SourceType::bits(4)).unwrap();
    let y = ctx.declare_var("y", &SourceType::bits(4)).unwrap();

    let x = g.add_var(&mut ctx, Loc::default(), x);
    let mask = g.add_const(&mut ctx, Loc::default(), Bits::from_u64(4, 5));
    let and = g
        .add_op_with(&mut ctx, VertexType::And, Loc::default(), DType::packed(4), &[x, mask])
        .unwrap();
    let y = g.add_var(&mut ctx, Loc::default(), y);
    y.add_driver(&mut ctx, 0, and);
    (ctx, g, and)
}

#[test]
fn dump_graph() {
    let (ctx, g, _) = setup();
    let mut text = String::new();
    g.dump_dot(&ctx, &mut text, "pre").unwrap();
    insta::assert_snapshot!(text, @r#"
    digraph "comb-pre" {
      graph [rankdir=LR]
      v0 [label="x\n[3:0]", shape=box]
      v3 [label="y\n[3:0]", shape=box]
      v1 [label="4'h5", shape=plain]
      v2 [label="And\n[3:0]", shape=circle]
      v2 -> v3 [headlabel="[3:0]"]
      v0 -> v2 [headlabel="lhs"]
      v1 -> v2 [headlabel="rhs"]
    }
    "#);
}

#[test]
fn dump_cone() {
    let (ctx, _, and) = setup();
    let mut text = String::new();
    and.dump_dot_cone(&ctx, &mut text, "cone").unwrap();
    insta::assert_snapshot!(text, @r#"
    digraph "cone" {
      graph [rankdir=LR]
      v0 [label="x\n[3:0]", shape=box]
      v1 [label="4'h5", shape=plain]
      v2 [label="And\n[3:0]", shape=circle]
      v0 -> v2 [headlabel="lhs"]
      v1 -> v2 [headlabel="rhs"]
    }
    "#);
}

#[test]
fn dump_files() {
    let (ctx, g, _) = setup();
    let dir = std::env::temp_dir().join(format!("logic-dfg-dump-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let config = DumpConfig::new(&dir, "test");

    let first = g.dump_dot_file_prefixed(&ctx, &config, "").unwrap();
    let second = g.dump_dot_file_prefixed(&ctx, &config, "").unwrap();
    assert_ne!(first, second);
    let name = first.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("test-") && name.ends_with("-comb.dot"), "{}", name);

    let mut expected = String::new();
    g.dump_dot(&ctx, &mut expected, "").unwrap();
    assert_eq!(std::fs::read_to_string(&first).unwrap(), expected);

    let cones = g.dump_dot_all_var_cones_prefixed(&ctx, &config, "cones").unwrap();
    assert_eq!(cones.len(), 1);
    let name = cones[0].file_name().unwrap().to_str().unwrap();
    assert!(name.ends_with("-comb-cones-y.dot"), "{}", name);
    assert!(std::fs::read_to_string(&cones[0])
        .unwrap()
        .starts_with("digraph \"comb-cones-y\" {"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn default_config() {
    let config = DumpConfig::default();
    assert_eq!(config.dir, std::path::PathBuf::from("."));
    assert_eq!(config.prefix, "dfg");
}
