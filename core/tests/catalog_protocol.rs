use sandblaster_core::{
    codec::ByteWriter, Catalog, Color, ExternalId, Ordinal, ParticleType, ProtocolError,
    ScriptedRandom, CURRENT_VERSION,
};

struct Record {
    name: &'static str,
    id: char,
    color: u32,
    drawable: bool,
    mobile: bool,
    density: f32,
    viscosity: f32,
    decay_probability: f32,
    lifetime: i32,
}

const RECORDS: [Record; 3] = [
    Record {
        name: "Wall",
        id: 'W',
        color: 0xffcc_cccc,
        drawable: true,
        mobile: false,
        density: 0.0,
        viscosity: 0.0,
        decay_probability: 0.0,
        lifetime: 0,
    },
    Record {
        name: "Fire",
        id: 'F',
        color: 0xffff_4400,
        drawable: true,
        mobile: true,
        density: -0.25,
        viscosity: 0.5,
        decay_probability: 0.75,
        lifetime: 12,
    },
    Record {
        name: "Plant",
        id: 'P',
        color: 0xff00_aa00,
        drawable: false,
        mobile: false,
        density: 1.5,
        viscosity: 0.125,
        decay_probability: 0.0,
        lifetime: -1,
    },
];

fn write_records(writer: &mut ByteWriter) {
    writer.write_f32(CURRENT_VERSION);
    writer.write_u8(RECORDS.len() as u8);
    for record in &RECORDS {
        writer.write_string(record.name);
        writer.write_u16(ExternalId::from_char(record.id).get());
        writer.write_u32(record.color);
        writer.write_bool(record.drawable);
        writer.write_bool(record.mobile);
        writer.write_f32(record.density);
        writer.write_f32(record.viscosity);
        writer.write_f32(record.decay_probability);
        writer.write_i32(record.lifetime);
    }
}

fn write_products(writer: &mut ByteWriter, products: &[(u8, f32)]) {
    writer.write_u8(products.len() as u8);
    for (ordinal, _) in products {
        writer.write_u8(*ordinal);
    }
    for (_, weight) in products {
        writer.write_f32(*weight);
    }
}

/// Wall never decays, fire decays into nothing or (via an unknown ordinal)
/// nothing again, plant has no products. Fire turns plants into fire.
fn sample_stream() -> Vec<u8> {
    let mut writer = ByteWriter::new();
    write_records(&mut writer);
    write_products(&mut writer, &[]);
    write_products(&mut writer, &[(0xff, 2.0), (9, 1.0)]);
    write_products(&mut writer, &[]);
    writer.write_u8(1);
    writer.write_u8(2);
    writer.write_f32(0.5);
    write_products(&mut writer, &[(1, 3.0)]);
    writer.write_u8(0xff);
    writer.into_bytes()
}

#[test]
fn decoded_attributes_match_encoded_values() {
    let catalog = Catalog::decode(&sample_stream()).expect("catalog decodes");
    assert_eq!(catalog.len(), RECORDS.len());

    for (index, record) in RECORDS.iter().enumerate() {
        let ordinal = Ordinal::new(index as u8);
        let by_ordinal = catalog.by_ordinal(ordinal).expect("ordinal resolves");
        let by_id = catalog
            .by_external_id(ExternalId::from_char(record.id))
            .expect("external id resolves");
        assert_eq!(by_ordinal, by_id);

        assert_eq!(by_ordinal.ordinal(), ordinal);
        assert_eq!(by_ordinal.name(), record.name);
        assert_eq!(by_ordinal.color(), Color::from_argb(record.color));
        assert_eq!(by_ordinal.drawable(), record.drawable);
        assert_eq!(by_ordinal.mobile(), record.mobile);
        assert_eq!(by_ordinal.density(), record.density);
        assert_eq!(by_ordinal.viscosity(), record.viscosity);
        assert_eq!(by_ordinal.decay_probability(), record.decay_probability);
        assert_eq!(by_ordinal.lifetime(), record.lifetime);
    }
}

#[test]
fn rules_and_products_are_resolved() {
    let catalog = Catalog::decode(&sample_stream()).expect("catalog decodes");
    let fire = catalog.by_name("fire").expect("fire");
    let plant = catalog.by_name("PLANT").expect("plant");

    assert_eq!(fire.transmutation_count(), 1);
    assert_eq!(plant.transmutation_count(), 0);

    let decay = fire.decay_products();
    assert_eq!(decay.len(), 2);
    assert_eq!(decay.total_weight(), 3.0);
    assert!(decay.products().iter().all(|product| product.particle.is_none()));

    let rule = catalog
        .rule(fire.ordinal(), plant.ordinal())
        .expect("fire burns plants");
    assert_eq!(rule.probability(), 0.5);
    assert_eq!(rule.products().total_weight(), 3.0);
    assert!(catalog.rule(plant.ordinal(), fire.ordinal()).is_none());

    let targets: Vec<_> = catalog
        .rules_for(fire.ordinal())
        .map(|rule| rule.target())
        .collect();
    assert_eq!(targets, vec![plant.ordinal()]);

    let mut rng = ScriptedRandom::constant(0.1);
    assert_eq!(
        catalog.maybe_transmute(Some(fire.ordinal()), Some(plant.ordinal()), &mut rng),
        Some(fire.ordinal())
    );
}

#[test]
fn encode_reproduces_the_wire_stream() {
    let catalog = Catalog::decode(&sample_stream()).expect("catalog decodes");
    let reencoded = Catalog::decode(&catalog.encode()).expect("re-encoded catalog decodes");
    assert_eq!(reencoded, catalog);
}

#[test]
fn no_transmutation_rule_is_a_no_op_for_every_pair() {
    let catalog = Catalog::decode(&sample_stream()).expect("catalog decodes");
    let mut rng = ScriptedRandom::constant(0.0);
    for agent in catalog.iter().map(ParticleType::ordinal) {
        for target in catalog.iter().map(ParticleType::ordinal) {
            if catalog.rule(agent, target).is_some() {
                continue;
            }
            assert_eq!(
                catalog.maybe_transmute(Some(agent), Some(target), &mut rng),
                Some(target)
            );
        }
    }
    assert_eq!(rng.consumed(), 0);
}

#[test]
fn version_mismatch_is_rejected() {
    let mut stream = sample_stream();
    stream[..4].copy_from_slice(&1.5f32.to_be_bytes());
    let error = Catalog::decode(&stream).expect_err("older version rejected");
    assert_eq!(
        error,
        ProtocolError::VersionMismatch {
            found: 1.5,
            expected: CURRENT_VERSION,
        }
    );
}

#[test]
fn every_truncation_is_rejected() {
    let stream = sample_stream();
    for length in 0..stream.len() {
        let error = Catalog::decode(&stream[..length])
            .expect_err("truncated stream must not produce a catalog");
        assert!(
            matches!(error, ProtocolError::UnexpectedEof { .. }),
            "length {length} produced {error:?}"
        );
    }
}

#[test]
fn unknown_transmutation_target_is_fatal() {
    let mut writer = ByteWriter::new();
    write_records(&mut writer);
    for _ in &RECORDS {
        write_products(&mut writer, &[]);
    }
    writer.write_u8(0);
    writer.write_u8(7);
    writer.write_f32(1.0);
    write_products(&mut writer, &[]);
    writer.write_u8(0xff);

    let error = Catalog::decode(&writer.into_bytes()).expect_err("unknown target rejected");
    assert_eq!(
        error,
        ProtocolError::UnknownTransmutationTarget {
            agent: 0,
            target: 7,
        }
    );
}

#[test]
fn out_of_range_agent_terminates_rule_stream() {
    let mut writer = ByteWriter::new();
    write_records(&mut writer);
    for _ in &RECORDS {
        write_products(&mut writer, &[]);
    }
    writer.write_u8(RECORDS.len() as u8);
    writer.write_u8(0xde);

    let catalog = Catalog::decode(&writer.into_bytes()).expect("catalog decodes");
    assert!(catalog.iter().all(|particle| particle.transmutation_count() == 0));
}

#[test]
fn empty_catalog_is_valid() {
    let mut writer = ByteWriter::new();
    writer.write_f32(CURRENT_VERSION);
    writer.write_u8(0);
    writer.write_u8(0xff);
    let catalog = Catalog::decode(&writer.into_bytes()).expect("empty catalog decodes");
    assert!(catalog.is_empty());
    assert!(catalog.by_ordinal(Ordinal::new(0)).is_none());
}
