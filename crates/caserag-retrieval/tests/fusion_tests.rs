use caserag_core::types::{Chunk, ChunkMeta};
use caserag_retrieval::fusion::{RankFuser, DEFAULT_RRF_K};

fn chunk(id: &str) -> Chunk {
    Chunk { id: id.to_string(), text: format!("text {id}"), meta: ChunkMeta { id: id.to_string(), category: "c".to_string(), codes: vec![], keywords: vec![] } }
}

fn list(ids: &[&str]) -> Vec<Chunk> { ids.iter().map(|id| chunk(id)).collect() }

fn ids(fused: &[caserag_retrieval::Fused]) -> Vec<&str> { fused.iter().map(|f| f.chunk.id.as_str()).collect() }

#[test]
fn worked_example_orders_ties_by_first_appearance() {
    let fused = RankFuser::default().fuse(&[list(&["A", "B", "C"]), list(&["B", "A", "D"])]);
    assert_eq!(ids(&fused), vec!["A", "B", "C", "D"]);
    let ab = 1.0 / 61.0 + 1.0 / 62.0;
    assert_eq!(fused[0].score, ab);
    assert_eq!(fused[1].score, ab);
    assert_eq!(fused[2].score, 1.0 / 63.0);
    assert_eq!(fused[3].score, 1.0 / 63.0);
}

#[test]
fn default_constant_is_sixty() {
    assert_eq!(RankFuser::default().k0(), DEFAULT_RRF_K);
    assert_eq!(DEFAULT_RRF_K, 60.0);
}

#[test]
fn repeating_one_list_keeps_its_order() {
    let single = list(&["E", "A", "C", "B", "D"]);
    let fuser = RankFuser::default();
    let once = fuser.fuse(std::slice::from_ref(&single));
    for n in 2..=5 {
        let repeated: Vec<Vec<Chunk>> = std::iter::repeat(single.clone()).take(n).collect();
        assert_eq!(ids(&fuser.fuse(&repeated)), ids(&once));
    }
    assert_eq!(ids(&once), vec!["E", "A", "C", "B", "D"]);
}

#[test]
fn repeated_fusion_is_bit_identical() {
    let lists = vec![list(&["A", "B", "C", "D"]), list(&["D", "C"]), list(&["C", "E", "A"])];
    let fuser = RankFuser::new(10.0);
    let first = fuser.fuse(&lists);
    for _ in 0..10 {
        let again = fuser.fuse(&lists);
        assert_eq!(ids(&again), ids(&first));
        let scores: Vec<u64> = again.iter().map(|f| f.score.to_bits()).collect();
        assert_eq!(scores, first.iter().map(|f| f.score.to_bits()).collect::<Vec<_>>());
    }
}

#[test]
fn first_occurrence_supplies_the_chunk() {
    let mut other = chunk("A");
    other.text = "a later rendering".to_string();
    let fused = RankFuser::default().fuse(&[list(&["A"]), vec![other]]);
    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].chunk.text, "text A");
    assert_eq!(fused[0].score, 2.0 / 61.0);
}

#[test]
fn empty_inputs_fuse_to_nothing() {
    assert!(RankFuser::default().fuse(&[]).is_empty());
    assert!(RankFuser::default().fuse(&[vec![], vec![]]).is_empty());
}

#[test]
fn items_in_more_lists_outrank_single_top_hits() {
    let fused = RankFuser::default().fuse(&[list(&["X", "Y"]), list(&["Z", "Y"]), list(&["W", "Y"])]);
    assert_eq!(fused[0].chunk.id, "Y");
    assert_eq!(ids(&fused)[1..].to_vec(), vec!["X", "Z", "W"]);
}
