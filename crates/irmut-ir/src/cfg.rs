//! Control flow graph queries.

use crate::function::Function;
use crate::instruction::Block;
use petgraph::algo::dominators::simple_fast;
use petgraph::graph::{DiGraph, NodeIndex};

/// Control flow graph of a function, one node per block
pub struct ControlFlowGraph {
    graph: DiGraph<Block, ()>,
    nodes: Vec<NodeIndex>,
}

impl ControlFlowGraph {
    pub fn build(func: &Function) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = func.blocks().map(|block| graph.add_node(block)).collect();
        for block in func.blocks() {
            for succ in func.successors(block) {
                if let Some(&to) = nodes.get(succ.index()) {
                    graph.add_edge(nodes[block.index()], to, ());
                }
            }
        }
        Self { graph, nodes }
    }

    /// Edges `pred -> succ` where `succ` dominates `pred`
    pub fn back_edges(&self) -> Vec<(Block, Block)> {
        let Some(&entry) = self.nodes.first() else {
            return Vec::new();
        };
        let doms = simple_fast(&self.graph, entry);

        let mut edges = Vec::new();
        for edge in self.graph.raw_edges() {
            let (pred, succ) = (edge.source(), edge.target());
            let dominated = doms
                .dominators(pred)
                .map(|mut chain| chain.any(|node| node == succ))
                .unwrap_or(false);
            if dominated {
                edges.push((self.graph[pred], self.graph[succ]));
            }
        }
        edges
    }
}

/// Returns true if some block branches to a block that dominates it
pub fn has_back_edge(func: &Function) -> bool {
    !ControlFlowGraph::build(func).back_edges().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;
    use crate::types::Type;

    fn diamond(loop_back: bool) -> Function {
        let mut func = Function::new("f", Type::Void);
        let c = func.add_param(Type::i1(), "c");
        let entry = func.add_block("entry");
        let left = func.add_block("left");
        let right = func.add_block("right");
        let exit = func.add_block("exit");

        let mut b = FunctionBuilder::at_end(&mut func, entry);
        b.cond_br(c, left, right);
        b.position_at_end(left);
        b.br(exit);
        b.position_at_end(right);
        if loop_back {
            b.br(entry);
        } else {
            b.br(exit);
        }
        b.position_at_end(exit);
        b.ret(None);
        func
    }

    #[test]
    fn test_acyclic_cfg() {
        assert!(!has_back_edge(&diamond(false)));
    }

    #[test]
    fn test_loop_is_back_edge() {
        let func = diamond(true);
        let edges = ControlFlowGraph::build(&func).back_edges();
        assert_eq!(edges, vec![(Block(2), Block(0))]);
        assert!(has_back_edge(&func));
    }

    #[test]
    fn test_self_loop() {
        let mut func = Function::new("f", Type::Void);
        let entry = func.add_block("entry");
        let body = func.add_block("body");
        let mut b = FunctionBuilder::at_end(&mut func, entry);
        b.br(body);
        b.position_at_end(body);
        b.br(body);
        assert!(has_back_edge(&func));
    }
}
