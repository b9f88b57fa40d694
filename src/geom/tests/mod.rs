mod test_wall_basic;
