use optflow_image::VectorField;
use optflow_io::{
    vector_field::{read_vector_field, write_vector_field},
    IoError,
};

#[test]
fn vector_field_file_round_trip() -> Result<(), IoError> {
    let tmp_dir = tempfile::tempdir()?;
    let file_path = tmp_dir.path().join("motion.pdvm");

    let mut field = VectorField::new([17, 9].into(), 2);
    for y in 0..9 {
        for x in 0..17 {
            let t = (x * 9 + y) as f32;
            field.set_vector(x, y, [t.sin() * 3.7, t.cos() / 7.0]);
            field.set_quality(x, y, 0, 1.0 / (1.0 + t));
            field.set_quality(x, y, 1, t.sqrt());
        }
    }

    write_vector_field(&file_path, &field)?;
    let back = read_vector_field(&file_path)?;

    assert_eq!(back.size(), field.size());
    assert_eq!(back.num_quality_channels(), 2);
    for (a, b) in field.as_slice().iter().zip(back.as_slice()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
    Ok(())
}

#[test]
fn missing_vector_field_file() {
    let result = read_vector_field("no/such/motion.pdvm");
    assert!(matches!(result, Err(IoError::FileDoesNotExist(_))));
}
