#![no_main]

use libfuzzer_sys::arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::{arbitrary, fuzz_target};
use logic_dfg::dfg::fuzzing::{arbitrary_graph, check_equality};
use logic_dfg::dfg::{Context, Graph};

struct TestCase {
    ctx: Context,
    graph: Graph,
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.ctx)
    }
}

impl Arbitrary<'_> for TestCase {
    fn arbitrary(u: &mut Unstructured<'_>) -> arbitrary::Result<Self> {
        let (ctx, graph) = arbitrary_graph(u)?;
        Ok(TestCase { ctx, graph })
    }
}

fuzz_target!(|testcase: TestCase| {
    let TestCase { mut ctx, graph } = testcase;
    check_equality(&mut ctx, graph);
});
