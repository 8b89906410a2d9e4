mod test_inspection;
