use std::io::Cursor;

use lembar::{
    storage::{cursor::ByteCursor, page_reader::PageReader},
    types::{
        error::DatabaseError,
        page::{PageHeader, PageType},
        value::Value,
    },
    utils::mock::{DatabaseBuilder, apples_database, build_leaf_page},
};

const PAGE_SIZE: u32 = 1024;

fn cursor(bytes: Vec<u8>) -> ByteCursor<Cursor<Vec<u8>>> {
    ByteCursor::new(Cursor::new(bytes))
}

/// A two-page image whose second page holds `rows`; page 1 is left empty.
fn image_with_page_two(rows: &[Vec<Value>]) -> Vec<u8> {
    let mut image = build_leaf_page(PAGE_SIZE, 100, &[]).unwrap();
    image.extend(build_leaf_page(PAGE_SIZE, 0, rows).unwrap());
    image
}

#[test]
fn test_reads_rows_in_cell_pointer_order() {
    let rows = vec![
        vec![Value::from("first"), Value::Integer(1)],
        vec![Value::from("second"), Value::Integer(2)],
        vec![Value::from("third"), Value::Null],
    ];
    let reader = PageReader::new(PAGE_SIZE, 0);
    let mut cursor = cursor(image_with_page_two(&rows));

    let decoded = reader.read_leaf_rows(&mut cursor, 2, 2).unwrap();
    assert_eq!(decoded.len(), 3);
    for (i, (row, expected)) in decoded.iter().zip(&rows).enumerate() {
        assert_eq!(&row.values, expected);
        assert_eq!(row.row_id, Some(i as u64 + 1));
    }
}

#[test]
fn test_zero_cells_is_an_empty_page_not_an_error() {
    let reader = PageReader::new(PAGE_SIZE, 0);
    let mut cursor = cursor(image_with_page_two(&[]));
    assert!(reader.read_leaf_rows(&mut cursor, 2, 4).unwrap().is_empty());
    assert_eq!(reader.count_cells(&mut cursor, 2).unwrap(), 0);
}

#[test]
fn test_page_one_header_follows_database_header() {
    let bytes = apples_database().build_bytes().unwrap();
    let reader = PageReader::new(4096, 0);
    let mut cursor = cursor(bytes);

    let header = reader.read_header(&mut cursor, 1).unwrap();
    assert_eq!(header.page_type, PageType::LeafTable);
    assert_eq!(header.cell_count, 1);
    assert_eq!(cursor.position(), 108);

    let pointers = reader.read_cell_pointers(&mut cursor, 1, &header).unwrap();
    assert_eq!(pointers.len(), 1);
    assert_eq!(pointers[0] as u32, header.cell_content_start);
}

#[test]
fn test_page_offset_is_one_indexed() {
    let reader = PageReader::new(4096, 0);
    assert_eq!(reader.page_offset(1), 0);
    assert_eq!(reader.page_offset(2), 4096);
    assert_eq!(reader.page_offset(5), 4 * 4096);
}

#[test]
fn test_interior_root_page_is_unsupported_layout() {
    let mut image = image_with_page_two(&[vec![Value::from("x")]]);
    let interior = PageHeader {
        page_type: PageType::InteriorTable,
        first_freeblock: 0,
        cell_count: 0,
        cell_content_start: PAGE_SIZE,
        fragmented_free_bytes: 0,
        right_pointer: Some(3),
    };
    let at = PAGE_SIZE as usize;
    image[at..at + 12].copy_from_slice(&interior.to_bytes());

    let reader = PageReader::new(PAGE_SIZE, 0);
    let header = reader.read_header(&mut cursor(image.clone()), 2).unwrap();
    assert_eq!(header.right_pointer, Some(3));

    let err = reader.read_leaf_rows(&mut cursor(image.clone()), 2, 1).unwrap_err();
    assert!(matches!(err, DatabaseError::UnsupportedLayout { .. }));
    let err = reader.count_cells(&mut cursor(image), 2).unwrap_err();
    assert!(matches!(err, DatabaseError::UnsupportedLayout { .. }));
}

#[test]
fn test_unknown_page_type_is_malformed() {
    let mut image = image_with_page_two(&[]);
    image[PAGE_SIZE as usize] = 0x07;
    let reader = PageReader::new(PAGE_SIZE, 0);
    let err = reader.read_header(&mut cursor(image), 2).unwrap_err();
    assert!(
        matches!(err, DatabaseError::MalformedStream { offset, .. } if offset == PAGE_SIZE as u64)
    );
}

#[test]
fn test_cell_pointer_outside_page_is_malformed() {
    let mut image = image_with_page_two(&[vec![Value::from("x")]]);
    // first pointer of page 2 sits right after its 8-byte header
    let at = PAGE_SIZE as usize + 8;
    image[at..at + 2].copy_from_slice(&(PAGE_SIZE as u16 + 10).to_be_bytes());
    let reader = PageReader::new(PAGE_SIZE, 0);
    let err = reader.read_leaf_rows(&mut cursor(image), 2, 1).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { .. }));
}

#[test]
fn test_impossible_cell_count_is_malformed() {
    let mut image = image_with_page_two(&[]);
    let at = PAGE_SIZE as usize + 3;
    image[at..at + 2].copy_from_slice(&u16::MAX.to_be_bytes());
    let reader = PageReader::new(PAGE_SIZE, 0);
    let err = reader.count_cells(&mut cursor(image), 2).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { .. }));
}

#[test]
fn test_page_past_end_of_file_is_malformed() {
    let bytes = DatabaseBuilder::with_page_size(1024).build_bytes().unwrap();
    let reader = PageReader::new(1024, 0);
    let err = reader.read_leaf_rows(&mut cursor(bytes), 7, 1).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { .. }));
}

#[test]
fn test_overflowing_payload_is_unsupported_layout() {
    let mut image = image_with_page_two(&[vec![Value::from("tiny")]]);
    // Rewrite the cell's payload-length varint to claim a payload bigger than
    // the page (two-byte varint 0x88 0x00 = 1024); the row-id byte follows.
    let reader = PageReader::new(PAGE_SIZE, 0);
    let header = reader.read_header(&mut cursor(image.clone()), 2).unwrap();
    let cell = PAGE_SIZE as usize + header.cell_content_start as usize;
    image.splice(cell..cell + 1, [0x88, 0x00]);
    image.truncate(2 * PAGE_SIZE as usize);
    let err = reader.read_leaf_rows(&mut cursor(image), 2, 1).unwrap_err();
    assert!(matches!(err, DatabaseError::UnsupportedLayout { .. }));
}

#[test]
fn test_record_longer_than_its_payload_is_malformed() {
    // "tiny" encodes as a 6-byte record: header [2, 21] then the text
    let mut image = image_with_page_two(&[vec![Value::from("tiny")]]);
    let reader = PageReader::new(PAGE_SIZE, 0);
    let header = reader.read_header(&mut cursor(image.clone()), 2).unwrap();
    let cell = PAGE_SIZE as usize + header.cell_content_start as usize;
    assert_eq!(image[cell], 6);
    image[cell] = 3;
    let err = reader.read_leaf_rows(&mut cursor(image), 2, 1).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { .. }));
}

#[test]
fn test_payload_running_past_page_end_is_malformed() {
    let mut image = image_with_page_two(&[vec![Value::from("tiny")]]);
    let reader = PageReader::new(PAGE_SIZE, 0);
    let header = reader.read_header(&mut cursor(image.clone()), 2).unwrap();
    let cell = PAGE_SIZE as usize + header.cell_content_start as usize;
    // still within the local payload limit, but the cell sits at the page end
    image[cell] = 100;
    image.extend(vec![0u8; PAGE_SIZE as usize]);
    let err = reader.read_leaf_rows(&mut cursor(image), 2, 1).unwrap_err();
    assert!(
        matches!(err, DatabaseError::MalformedStream { offset, .. } if offset == cell as u64)
    );
}
