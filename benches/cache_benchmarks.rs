use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sfref::doc::parser::{RetrievalStrategy, TocParser};
use sfref::storage::{DocumentationCache, SharedCache};
use sfref::{DocCategory, TocEntry};

fn sample_entries(count: usize) -> Vec<TocEntry> {
    (0..count)
        .map(|i| {
            let category = DocCategory::ALL[i % DocCategory::ALL.len()];
            // Scatter titles so appends land all over the index.
            let title = format!("Type{:05} Class", (i * 7919) % count.max(1));
            TocEntry::new(title, format!("/type_{}.htm", i), category)
        })
        .collect()
}

fn create_leaf_parent_toc(types: usize, methods: usize) -> String {
    let children: Vec<String> = (0..types)
        .map(|t| {
            let leaves: Vec<String> = (0..methods)
                .map(|m| format!(r#"{{"text":"method{}()","a_attr":{{"href":"/t{}.htm#m{}"}}}}"#, m, t, m))
                .collect();
            format!(
                r#"{{"text":"Type{} Class","a_attr":{{"href":"/t{}.htm"}},"children":[{}]}}"#,
                t,
                t,
                leaves.join(",")
            )
        })
        .collect();
    format!(
        r#"{{"toc":[{{"id":"apex_reference","text":"Apex Reference","children":[{}]}}]}}"#,
        children.join(",")
    )
}

fn bench_cache_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_append");

    for &count in &[100usize, 1000, 5000] {
        let entries = sample_entries(count);
        group.bench_with_input(BenchmarkId::new("append", count), &entries, |b, entries| {
            b.iter(|| {
                let mut cache = DocumentationCache::new();
                for entry in entries.iter().cloned() {
                    cache.append(entry);
                }
                black_box(cache.len())
            });
        });
        group.bench_with_input(BenchmarkId::new("from_entries", count), &entries, |b, entries| {
            b.iter(|| black_box(DocumentationCache::from_entries(entries.iter().cloned())));
        });
    }

    group.finish();
}

fn bench_cache_lookup(c: &mut Criterion) {
    let cache = SharedCache::new();
    for entry in sample_entries(3000) {
        cache.append(entry);
    }

    c.bench_function("shared_cache_titles_all", |b| {
        b.iter(|| black_box(cache.titles(None)))
    });
    c.bench_function("shared_cache_resolve_category", |b| {
        b.iter(|| black_box(cache.resolve(Some(DocCategory::Visualforce), 500)))
    });
}

fn bench_toc_flattening(c: &mut Criterion) {
    let parser = TocParser::new();
    let strategy = RetrievalStrategy::LeafParents { anchor_id: "apex_reference" };

    let mut group = c.benchmark_group("toc_flattening");
    group.sample_size(20);

    for &types in &[50usize, 500, 2000] {
        let toc = create_leaf_parent_toc(types, 8);
        group.bench_with_input(BenchmarkId::new("leaf_parents", types), &toc, |b, toc| {
            b.iter(|| black_box(parser.parse_entries(toc, DocCategory::Apex, strategy)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cache_append, bench_cache_lookup, bench_toc_flattening);
criterion_main!(benches);
