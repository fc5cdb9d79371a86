use criterion::{black_box, criterion_group, criterion_main, Criterion};
use registry_enrich::services::profile::{extract_representatives, normalize_profile};
use serde_json::{json, Value};

/// A realistic report payload: a populated company object with the
/// representative block buried a few levels down.
fn report_fixture() -> Value {
    json!({
        "data": {
            "company": {
                "denominacion": "ACME SOLUTIONS SL",
                "nif": "B12345678",
                "cnae": "6201",
                "formaJuridica": "Sociedad Limitada",
                "situacion": "Activa",
                "empleados": "420",
                "ventas": 12500000.5,
                "ejercicio": 2024,
                "domicilio": {
                    "direccion": "Calle Mayor 1",
                    "codigoPostal": 28001,
                    "localidad": "Madrid",
                    "provincia": "Madrid"
                },
                "organos": {
                    "gobierno": {
                        "administradores": [
                            {"nombre": "Jane Roe", "cargo": "Presidente"},
                            {"nombre": "John Doe", "cargo": "Vocal"},
                            "Alex Smith"
                        ]
                    }
                }
            }
        }
    })
}

/// A pathological payload nested close to the traversal depth bound.
fn deep_fixture() -> Value {
    let mut value = json!({"administradores": [{"nombre": "Jane Roe"}]});
    for i in 0..18 {
        let mut map = serde_json::Map::new();
        map.insert(format!("level{}", i), value);
        map.insert("noise".to_string(), json!([1, 2, 3]));
        value = Value::Object(map);
    }
    value
}

fn benchmark_normalization(c: &mut Criterion) {
    let report = report_fixture();
    let deep = deep_fixture();

    let mut group = c.benchmark_group("normalization");

    group.bench_function("normalize_full_report", |b| {
        b.iter(|| normalize_profile(black_box(&report), black_box("B12345678")))
    });

    group.bench_function("extract_representatives_shallow", |b| {
        b.iter(|| extract_representatives(black_box(&report)))
    });

    group.bench_function("extract_representatives_deep", |b| {
        b.iter(|| extract_representatives(black_box(&deep)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_normalization);
criterion_main!(benches);
