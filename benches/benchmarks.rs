use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geoipcli::record::{Record, ToRecord};
use geoipcli::schema::{City, CityInfo, CountryInfo, Location, Subdivision};
use geoipcli::{
    flatten, Column, DatasetKind, Datasets, Error, Escapes, Format, Lookup, Resolver, RowWriter,
};
use std::collections::BTreeMap;
use std::hint::black_box;
use std::net::IpAddr;

// A fully populated City record, the largest layout geoipcli flattens.
fn sample_city() -> City {
    let names: BTreeMap<String, String> = [
        ("de", "Tokio"),
        ("en", "Tokyo"),
        ("es", "Tokio"),
        ("fr", "Tokyo"),
        ("ja", "東京"),
        ("pt-BR", "Tóquio"),
        ("ru", "Токио"),
        ("zh-CN", "东京"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    City {
        city: CityInfo {
            geoname_id: 1850147,
            names: names.clone(),
        },
        country: CountryInfo {
            geoname_id: 1861060,
            iso_code: "JP".to_string(),
            names: names.clone(),
            ..CountryInfo::default()
        },
        location: Location {
            accuracy_radius: 500,
            latitude: 35.6895,
            longitude: 139.6917,
            metro_code: 0,
            time_zone: "Asia/Tokyo".to_string(),
        },
        subdivisions: vec![Subdivision {
            geoname_id: 1850144,
            iso_code: "13".to_string(),
            names,
        }],
        ..City::default()
    }
}

#[derive(Debug)]
struct Constant(Record);

impl Lookup for Constant {
    fn lookup(&self, _ip: IpAddr) -> geoipcli::Result<Record> {
        Ok(self.0.clone())
    }
}

#[derive(Debug)]
struct Nowhere;

impl Lookup for Nowhere {
    fn lookup(&self, ip: IpAddr) -> geoipcli::Result<Record> {
        Err(Error::AddressNotFound { ip })
    }
}

fn generate_addresses(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            if i % 4 == 3 {
                format!("2001:db8:{:x}::{:x}", i % 65536, (i * 7) % 65536)
            } else {
                format!(
                    "{}.{}.{}.{}",
                    (i % 223) + 1,
                    (i * 7) % 256,
                    (i * 13) % 256,
                    (i * 17) % 256
                )
            }
        })
        .collect()
}

fn bench_flatten(c: &mut Criterion) {
    let record = sample_city().to_record();

    let mut group = c.benchmark_group("flatten");
    group.bench_function("city", |b| {
        b.iter(|| black_box(flatten(black_box(&record))));
    });
    group.bench_function("city_to_record", |b| {
        let city = sample_city();
        b.iter(|| black_box(flatten(&black_box(&city).to_record())));
    });
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut datasets = Datasets::default();
    datasets.insert(DatasetKind::City, Constant(sample_city().to_record()));
    let ip: IpAddr = "1.0.16.1".parse().unwrap();

    let mut group = c.benchmark_group("extract");
    for name in ["city.city.names.ja", "city.location.latitude", "city.subdivisions.0.iso_code"] {
        let column = Column::parse(name).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &column, |b, column| {
            b.iter(|| black_box(geoipcli::extract(column, &datasets, black_box(ip)).unwrap()));
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let addresses = generate_addresses(1000);
    let columns = [
        "city.country.iso_code",
        "city.city.names.en",
        "city.location.latitude",
        "city.location.longitude",
        "city.subdivisions.0.names.en",
    ];

    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(addresses.len() as u64));

    for format in [Format::Csv, Format::Tsv] {
        let mut datasets = Datasets::default();
        datasets.insert(DatasetKind::City, Constant(sample_city().to_record()));
        let resolver = Resolver::new(datasets, &columns, false).unwrap();

        group.bench_function(BenchmarkId::new("found", format!("{:?}", format)), |b| {
            b.iter(|| {
                let out = Vec::with_capacity(1 << 16);
                let mut writer = RowWriter::new(out, format, Escapes::default());
                resolver.run(black_box(&addresses), &mut writer).unwrap();
                black_box(writer.into_inner().unwrap());
            });
        });
    }

    // Misses skip flattening entirely and print empty columns.
    let mut datasets = Datasets::default();
    datasets.insert(DatasetKind::City, Nowhere);
    let resolver = Resolver::new(datasets, &columns, false).unwrap();
    group.bench_function("not_found", |b| {
        b.iter(|| {
            let out = Vec::with_capacity(1 << 16);
            let mut writer = RowWriter::new(out, Format::Csv, Escapes::default());
            resolver.run(black_box(&addresses), &mut writer).unwrap();
            black_box(writer.into_inner().unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_flatten, bench_extract, bench_resolve);
criterion_main!(benches);
