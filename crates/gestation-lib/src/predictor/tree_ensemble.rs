//! `ai.onnx.ml` TreeEnsembleRegressor for tract
//!
//! skl2onnx exports forest regressors as a single `TreeEnsembleRegressor`
//! node. tract only ships the classifier flavour, so the regressor is parsed
//! here and lowered onto tract's tree evaluator, plus the optional
//! `base_values` offset.

use tract_onnx::model::{OnnxOpRegister, ParsingContext};
use tract_onnx::pb::NodeProto;
use tract_onnx::pb_helpers::AttrTVecType;
use tract_onnx::tract_hir::internal::*;
use tract_onnx_opl::ml::tree::{Cmp, TreeEnsemble, TreeEnsembleData};
use tract_onnx_opl::ml::tree_ensemble_classifier::{parse_aggregate, TreeEnsembleClassifier};

/// Add the regressor to an ONNX op register
pub fn register(reg: &mut OnnxOpRegister) {
    reg.insert("TreeEnsembleRegressor", tree_regressor);
}

fn tree_regressor(
    _ctx: &ParsingContext,
    node: &NodeProto,
) -> TractResult<(Box<dyn InferenceOp>, Vec<String>)> {
    let ensemble = parse_ensemble(node)?;
    let base_values = get_vec_attr_opt::<f32>(node, "base_values", ensemble.n_classes())?
        .map(|v| rctensor1(&v));

    let post_transform = node.get_attr_opt::<&str>("post_transform")?.unwrap_or("NONE");
    node.expect_attr("post_transform", post_transform == "NONE", "NONE for a regressor")?;

    Ok((expand(TreeEnsembleRegressor { ensemble, base_values }), vec![]))
}

fn parse_mode(s: &str) -> TractResult<Option<Cmp>> {
    match s {
        "BRANCH_LEQ" => Ok(Some(Cmp::LessEqual)),
        "BRANCH_LT" => Ok(Some(Cmp::Less)),
        "BRANCH_GTE" => Ok(Some(Cmp::GreaterEqual)),
        "BRANCH_GT" => Ok(Some(Cmp::Greater)),
        "BRANCH_EQ" => Ok(Some(Cmp::Equal)),
        "BRANCH_NEQ" => Ok(Some(Cmp::NotEqual)),
        "LEAF" => Ok(None),
        _ => bail!("Unsupported node mode: {}", s),
    }
}

fn get_vec_attr<'a, T>(node: &'a NodeProto, attr: &str, n: usize) -> TractResult<Vec<T>>
where
    T: AttrTVecType<'a>,
{
    let vec = node.get_attr_vec(attr)?;
    node.expect_attr(attr, vec.len() == n, || format!("length {}, got {}", n, vec.len()))?;
    Ok(vec)
}

fn get_vec_attr_opt<'a, T>(node: &'a NodeProto, attr: &str, n: usize) -> TractResult<Option<Vec<T>>>
where
    T: AttrTVecType<'a>,
{
    match node.get_attr_opt_vec(attr)? {
        Some(vec) => {
            node.expect_attr(attr, vec.len() == n, || format!("length {}, got {}", n, vec.len()))?;
            Ok(Some(vec))
        }
        None => Ok(None),
    }
}

/// Pack the node and target attributes into tract's flat tree layout.
///
/// Node rows are `[feature, true row, false row, threshold bits, flags]` for
/// branches and `[first leaf, end leaf, 0, 0, 0]` for leaves. Leaf rows are
/// `[target id, weight bits]`.
fn parse_ensemble(node: &NodeProto) -> TractResult<TreeEnsemble> {
    let n_targets: usize = node.get_attr_opt("n_targets")?.unwrap_or(1);

    let n_nodes = node.get_attr_slice::<i64>("nodes_featureids")?.len();
    node.expect_attr("nodes_featureids", n_nodes != 0, "at least one node")?;

    let node_ids = get_vec_attr::<usize>(node, "nodes_nodeids", n_nodes)?;
    let tree_ids = get_vec_attr::<usize>(node, "nodes_treeids", n_nodes)?;
    let feature_ids = get_vec_attr::<usize>(node, "nodes_featureids", n_nodes)?;
    let true_ids = get_vec_attr::<usize>(node, "nodes_truenodeids", n_nodes)?;
    let false_ids = get_vec_attr::<usize>(node, "nodes_falsenodeids", n_nodes)?;
    let thresholds = get_vec_attr::<f32>(node, "nodes_values", n_nodes)?;
    let nan_is_true = get_vec_attr_opt::<bool>(node, "nodes_missing_value_tracks_true", n_nodes)?
        .unwrap_or_else(|| vec![false; n_nodes]);
    let modes = get_vec_attr::<&str>(node, "nodes_modes", n_nodes)?
        .into_iter()
        .map(parse_mode)
        .collect::<TractResult<Vec<_>>>()?;

    let aggregate = parse_aggregate(node.get_attr_opt("aggregate_function")?.unwrap_or("SUM"))?;

    let n_leaves = node.get_attr_slice::<i64>("target_ids")?.len();
    node.expect_attr("target_ids", n_leaves != 0, "at least one target")?;
    let leaf_node_ids = get_vec_attr::<usize>(node, "target_nodeids", n_leaves)?;
    let leaf_tree_ids = get_vec_attr::<usize>(node, "target_treeids", n_leaves)?;
    let leaf_target_ids = get_vec_attr::<usize>(node, "target_ids", n_leaves)?;
    let leaf_weights = get_vec_attr::<f32>(node, "target_weights", n_leaves)?;

    for &target in &leaf_target_ids {
        node.expect_attr("target_ids", target < n_targets, "ids below n_targets")?;
    }
    let consecutive = |ids: &[usize]| ids.windows(2).all(|w| w[1] == w[0] || w[1] == w[0] + 1);
    node.expect_attr("nodes_treeids", consecutive(&tree_ids), "tree ids increasing by 1")?;
    node.expect_attr("target_treeids", consecutive(&leaf_tree_ids), "tree ids increasing by 1")?;
    node.expect_attr("nodes_treeids", tree_ids[0] == 0, "tree ids starting at 0")?;
    node.expect_attr("target_treeids", leaf_tree_ids[0] == 0, "tree ids starting at 0")?;
    node.expect(
        tree_ids.last() == leaf_tree_ids.last(),
        "same number of trees in nodes and targets",
    )?;

    let mut node_order: Vec<usize> = (0..n_nodes).collect();
    node_order.sort_by_key(|&ix| (tree_ids[ix], node_ids[ix]));
    let mut leaf_order: Vec<usize> = (0..n_leaves).collect();
    leaf_order.sort_by_key(|&ix| (leaf_tree_ids[ix], leaf_node_ids[ix]));

    let mut trees: Vec<u32> = vec![];
    let mut nodes: Vec<u32> = vec![];
    let mut leaves: Vec<u32> = vec![];
    let mut current_tree = None;
    let mut root = 0u32;
    let mut next_leaf = 0;

    for n in node_order {
        let tree_id = tree_ids[n];
        if Some(tree_id) != current_tree {
            current_tree = Some(tree_id);
            root = (nodes.len() / 5) as u32;
            trees.push(root);
        }
        match modes[n] {
            Some(cmp) => nodes.extend([
                feature_ids[n] as u32,
                true_ids[n] as u32 + root,
                false_ids[n] as u32 + root,
                thresholds[n].to_bits(),
                (0x0100 * nan_is_true[n] as u32) | cmp as u32,
            ]),
            None => {
                let first = (leaves.len() / 2) as u32;
                while next_leaf < leaf_order.len()
                    && leaf_tree_ids[leaf_order[next_leaf]] == tree_id
                    && leaf_node_ids[leaf_order[next_leaf]] == node_ids[n]
                {
                    let ix = leaf_order[next_leaf];
                    leaves.push(leaf_target_ids[ix] as u32);
                    leaves.push(leaf_weights[ix].to_bits());
                    next_leaf += 1;
                }
                nodes.extend([first, (leaves.len() / 2) as u32, 0, 0, 0]);
            }
        }
    }

    let max_used_feature = feature_ids.iter().copied().max().unwrap_or(0);
    let data = TreeEnsembleData {
        trees: rctensor1(&trees),
        nodes: tensor1(&nodes).into_shape(&[nodes.len() / 5, 5])?.into_arc_tensor(),
        leaves: tensor1(&leaves).into_shape(&[leaves.len() / 2, 2])?.into_arc_tensor(),
    };
    TreeEnsemble::build(data, max_used_feature, n_targets, aggregate)
}

#[derive(Debug, Clone, Hash)]
struct TreeEnsembleRegressor {
    ensemble: TreeEnsemble,
    base_values: Option<Arc<Tensor>>,
}

impl Expansion for TreeEnsembleRegressor {
    fn name(&self) -> Cow<str> {
        "TreeEnsembleRegressor".into()
    }

    fn rules<'r, 'p: 'r, 's: 'r>(
        &'s self,
        s: &mut Solver<'r>,
        inputs: &'p [TensorProxy],
        outputs: &'p [TensorProxy],
    ) -> InferenceResult {
        check_input_arity(inputs, 1)?;
        check_output_arity(outputs, 1)?;

        s.equals(&outputs[0].datum_type, DatumType::F32)?;
        s.equals(&outputs[0].rank, 2)?;
        s.equals(&outputs[0].shape[0], &inputs[0].shape[0])?;
        s.equals(&outputs[0].shape[1], self.ensemble.n_classes().to_dim())?;
        Ok(())
    }

    fn wire(
        &self,
        prefix: &str,
        model: &mut TypedModel,
        inputs: &[OutletId],
    ) -> TractResult<TVec<OutletId>> {
        // The classifier op is the bare ensemble evaluation: [N, n_targets] sums
        let mut scores = model.wire_node(
            format!("{prefix}.trees"),
            TreeEnsembleClassifier { ensemble: self.ensemble.clone() },
            inputs,
        )?;
        if let Some(base_values) = self.base_values.as_deref() {
            let base = base_values.clone().broadcast_into_rank(2)?.into_arc_tensor();
            let base = model.add_const(format!("{prefix}.base"), base)?;
            scores = model.wire_node(
                format!("{prefix}.base_values"),
                tract_core::ops::math::add(),
                &[scores[0], base],
            )?;
        }
        Ok(scores)
    }
}
